use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A hidden search term and the HTML revealed when it is entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecretKeyword {
    pub key: &'static str,
    pub content_html: &'static str,
}

include!(concat!(env!("OUT_DIR"), "/keyword_catalog.rs"));

/// How long the reveal flags stay raised after a keyword is found.
pub const REVEAL_GRACE_MS: u32 = 3000;

pub fn lookup(query: &str) -> Option<&'static SecretKeyword> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    SECRET_KEYWORDS.iter().find(|keyword| keyword.key == needle)
}

pub fn keyword_keys() -> impl Iterator<Item = &'static str> {
    SECRET_KEYWORDS.iter().map(|keyword| keyword.key)
}

/// Keywords that occur inside string literals of a Rust source file.
pub fn find_leaks(source: &str) -> Vec<&'static str> {
    let text = string_literals(source).join(" ").to_lowercase();
    keyword_keys().filter(|key| text.contains(key)).collect()
}

fn string_literals(source: &str) -> Vec<String> {
    let chars: Vec<char> = source.chars().collect();
    let mut literals = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        match chars[i] {
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            '\'' => {
                // char literal or lifetime; a quote inside one is not a string
                i += if next == Some('\\') { 3 } else { 2 };
                if chars.get(i) == Some(&'\'') {
                    i += 1;
                }
            }
            '"' => {
                let (literal, end) = cooked_literal(&chars, i + 1);
                literals.push(literal);
                i = end;
            }
            'r' | 'b' if starts_token(&chars, i) => match prefixed_literal(&chars, i) {
                Some((literal, end)) => {
                    literals.push(literal);
                    i = end;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }
    literals
}

fn starts_token(chars: &[char], at: usize) -> bool {
    at == 0 || !(chars[at - 1].is_alphanumeric() || chars[at - 1] == '_')
}

/// Body of a `"..."` literal whose opening quote sits just before `start`,
/// plus the index after the closing quote.
fn cooked_literal(chars: &[char], start: usize) -> (String, usize) {
    let mut literal = String::new();
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                if let Some(&escaped) = chars.get(i + 1) {
                    literal.push(escaped);
                }
                i += 2;
            }
            '"' => return (literal, i + 1),
            other => {
                literal.push(other);
                i += 1;
            }
        }
    }
    (literal, i)
}

/// `b"..."`, `r"..."`, `br"..."` and their `#`-delimited raw forms.
fn prefixed_literal(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    if chars[i] == 'b' {
        i += 1;
    }
    match chars.get(i) {
        Some('"') if i > start => return Some(cooked_literal(chars, i + 1)),
        Some('r') => i += 1,
        _ => return None,
    }
    let hashes_start = i;
    while chars.get(i) == Some(&'#') {
        i += 1;
    }
    let hashes = i - hashes_start;
    if chars.get(i) != Some(&'"') {
        return None;
    }
    let body_start = i + 1;
    let mut end = body_start;
    while end < chars.len() {
        if chars[end] == '"' && (1..=hashes).all(|n| chars.get(end + n) == Some(&'#')) {
            let literal = chars[body_start..end].iter().collect();
            return Some((literal, end + 1 + hashes));
        }
        end += 1;
    }
    Some((chars[body_start..].iter().collect(), chars.len()))
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealSnapshot {
    pub active: Option<&'static SecretKeyword>,
    pub just_revealed: bool,
    pub scrolling_to_keyword: bool,
}

impl RevealSnapshot {
    pub fn active_key(&self) -> Option<&'static str> {
        self.active.map(|keyword| keyword.key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealToken(u64);

pub type RevealHook = Rc<dyn Fn(&RevealSnapshot)>;

/// Which keyword is on screen, shared by the search box and the sections
/// that render keyword content. Created once at startup and handed to
/// consumers; navigation calls [`KeywordReveal::reset`].
pub struct KeywordReveal {
    snapshot: RefCell<RevealSnapshot>,
    generation: Cell<u64>,
    hooks: RefCell<Vec<(u64, RevealHook)>>,
    next_hook_id: Cell<u64>,
}

impl KeywordReveal {
    pub fn new() -> Self {
        Self {
            snapshot: RefCell::new(RevealSnapshot::default()),
            generation: Cell::new(0),
            hooks: RefCell::new(Vec::new()),
            next_hook_id: Cell::new(1),
        }
    }

    pub fn snapshot(&self) -> RevealSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Returns a token to pass to [`KeywordReveal::expire`] once the grace
    /// period is over; `None` when the keyword was cleared.
    pub fn set_active(&self, keyword: Option<&'static SecretKeyword>) -> Option<RevealToken> {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        let next = match keyword {
            Some(keyword) => RevealSnapshot {
                active: Some(keyword),
                just_revealed: true,
                scrolling_to_keyword: true,
            },
            None => RevealSnapshot::default(),
        };
        self.replace(next);
        keyword.map(|_| RevealToken(generation))
    }

    /// Drops the reveal flags if `token` is still the latest reveal.
    pub fn expire(&self, token: RevealToken) -> bool {
        if token.0 != self.generation.get() {
            return false;
        }
        let mut next = self.snapshot();
        if !next.just_revealed && !next.scrolling_to_keyword {
            return false;
        }
        next.just_revealed = false;
        next.scrolling_to_keyword = false;
        self.replace(next);
        true
    }

    pub fn reset(&self) {
        self.set_active(None);
    }

    pub fn subscribe(&self, hook: RevealHook) -> u64 {
        let id = self.next_hook_id.get();
        self.next_hook_id.set(id.saturating_add(1));
        self.hooks.borrow_mut().push((id, hook));
        id
    }

    pub fn unsubscribe(&self, id: u64) {
        self.hooks.borrow_mut().retain(|(hook_id, _)| *hook_id != id);
    }

    fn replace(&self, next: RevealSnapshot) {
        {
            let mut snapshot = self.snapshot.borrow_mut();
            if *snapshot == next {
                return;
            }
            *snapshot = next.clone();
        }
        let hooks: Vec<_> = self
            .hooks
            .borrow()
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect();
        for hook in hooks {
            hook(&next);
        }
    }
}

impl Default for KeywordReveal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeywordReveal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordReveal")
            .field("snapshot", &*self.snapshot.borrow())
            .field("generation", &self.generation.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first() -> &'static SecretKeyword {
        &SECRET_KEYWORDS[0]
    }

    #[test]
    fn catalog_is_not_empty() {
        assert!(!SECRET_KEYWORDS.is_empty());
        assert!(SECRET_KEYWORDS.iter().all(|kw| !kw.content_html.is_empty()));
    }

    #[test]
    fn lookup_normalises_query() {
        let key = first().key;
        let shouted = format!("  {}\t", key.to_uppercase());
        assert_eq!(lookup(&shouted), Some(first()));
        assert_eq!(lookup(""), None);
        assert_eq!(lookup("   "), None);
        assert_eq!(lookup(&format!("{key}s")), None);
    }

    #[test]
    fn leaks_only_count_string_literals() {
        let key = first().key;
        let commented = format!("// {key}\nlet a = 1; /* {key} */");
        assert!(find_leaks(&commented).is_empty());
        let literal = format!("let copy = \"We keep {} close\";", key.to_uppercase());
        assert_eq!(find_leaks(&literal), vec![key]);
        let escaped = format!("let q = \"say \\\"{key}\\\"\";");
        assert_eq!(find_leaks(&escaped), vec![key]);
    }

    #[test]
    fn raw_and_byte_strings_are_scanned() {
        let key = first().key;
        let hashed = format!("let copy = r#\"she said \"{key}\" twice\"#;");
        assert_eq!(find_leaks(&hashed), vec![key]);
        let plain = format!("let copy = r\"a {key} b\";");
        assert_eq!(find_leaks(&plain), vec![key]);
        let bytes = format!("let copy = b\"{key}\"; let raw = br##\"x \"# {key}\"##;");
        assert_eq!(find_leaks(&bytes), vec![key]);
    }

    #[test]
    fn raw_identifiers_and_names_ending_in_r_are_not_strings() {
        let key = first().key;
        let source = format!("let r#type = 1; let bar = 2; // r\"{key}\"\nlet b = 'r';");
        assert!(find_leaks(&source).is_empty());
    }

    #[test]
    fn char_literal_quotes_do_not_open_strings() {
        let key = first().key;
        let source = format!("let q = '\"'; let name = {key}; let r = '\"';");
        assert!(find_leaks(&source).is_empty());
    }

    #[test]
    fn reveal_sets_and_expires_flags() {
        let reveal = KeywordReveal::new();
        let token = reveal.set_active(Some(first())).unwrap();
        let snapshot = reveal.snapshot();
        assert_eq!(snapshot.active_key(), Some(first().key));
        assert!(snapshot.just_revealed && snapshot.scrolling_to_keyword);

        assert!(reveal.expire(token));
        let snapshot = reveal.snapshot();
        assert_eq!(snapshot.active_key(), Some(first().key));
        assert!(!snapshot.just_revealed && !snapshot.scrolling_to_keyword);
        assert!(!reveal.expire(token));
    }

    #[test]
    fn stale_token_does_not_cut_a_newer_reveal_short() {
        let reveal = KeywordReveal::new();
        let stale = reveal.set_active(Some(first())).unwrap();
        reveal.set_active(None);
        let fresh = reveal.set_active(Some(first())).unwrap();
        assert!(!reveal.expire(stale));
        assert!(reveal.snapshot().just_revealed);
        assert!(reveal.expire(fresh));
    }

    #[test]
    fn reset_clears_and_notifies() {
        let reveal = KeywordReveal::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = reveal.subscribe(Rc::new(move |snapshot: &RevealSnapshot| {
            sink.borrow_mut().push(snapshot.active_key());
        }));
        reveal.set_active(Some(first()));
        reveal.reset();
        reveal.reset();
        reveal.unsubscribe(id);
        reveal.set_active(Some(first()));
        assert_eq!(*seen.borrow(), vec![Some(first().key), None]);
        assert_eq!(reveal.set_active(None), None);
    }
}
