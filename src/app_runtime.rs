use std::cell::RefCell;

const DEFAULT_BACKGROUND_IMAGE: &str = "images/meadow.jpg";
const DEFAULT_CONTACT_ENDPOINT: &str = "/api/contact";

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SiteConfig {
    pub(crate) background_image: String,
    pub(crate) contact_endpoint: String,
}

impl SiteConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            background_image: configured(
                option_env!("MEADOW_BACKGROUND_IMAGE")
                    .or(option_env!("TRUNK_PUBLIC_MEADOW_BACKGROUND_IMAGE")),
                DEFAULT_BACKGROUND_IMAGE,
            ),
            contact_endpoint: configured(
                option_env!("MEADOW_CONTACT_ENDPOINT")
                    .or(option_env!("TRUNK_PUBLIC_MEADOW_CONTACT_ENDPOINT")),
                DEFAULT_CONTACT_ENDPOINT,
            ),
        }
    }
}

fn configured(raw: Option<&str>, fallback: &str) -> String {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

thread_local! {
    static SITE_CONFIG: RefCell<Option<SiteConfig>> = RefCell::new(None);
}

pub(crate) fn set_site_config(config: SiteConfig) {
    SITE_CONFIG.with(|slot| {
        *slot.borrow_mut() = Some(config);
    });
}

pub(crate) fn site_config() -> SiteConfig {
    SITE_CONFIG
        .with(|slot| slot.borrow().clone())
        .unwrap_or_else(SiteConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back() {
        assert_eq!(configured(None, "a"), "a");
        assert_eq!(configured(Some("   "), "a"), "a");
        assert_eq!(configured(Some(" /relay "), "a"), "/relay");
    }

    #[test]
    fn stored_config_wins_over_env() {
        let config = SiteConfig {
            background_image: "images/dusk.jpg".to_string(),
            contact_endpoint: "https://relay.example.com".to_string(),
        };
        set_site_config(config.clone());
        assert_eq!(site_config(), config);
    }
}
