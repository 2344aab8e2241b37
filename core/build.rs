use std::collections::HashSet;
use std::env;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Deserialize)]
struct CatalogFile {
    keywords: Vec<KeywordEntry>,
}

#[derive(Deserialize)]
struct KeywordEntry {
    key: String,
    content: String,
}

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    let env_path = workspace_root.join(".env");
    let env_local_path = workspace_root.join(".env.local");

    let _ = dotenvy::from_filename(&env_local_path);
    let _ = dotenvy::from_filename(&env_path);

    println!("cargo:rerun-if-env-changed=KEYWORD_CATALOG_PATH");
    println!("cargo:rerun-if-changed={}", env_path.display());
    println!("cargo:rerun-if-changed={}", env_local_path.display());

    let catalog_path = resolve_catalog_path(workspace_root);
    println!("cargo:rerun-if-changed={}", catalog_path.display());

    let contents = fs::read_to_string(&catalog_path).unwrap_or_else(|err| {
        panic!(
            "failed to read keyword catalog at {}: {err}",
            catalog_path.display()
        )
    });

    let catalog: CatalogFile = toml::from_str(&contents).unwrap_or_else(|err| {
        panic!(
            "failed to parse keyword catalog at {}: {err}",
            catalog_path.display()
        )
    });

    if catalog.keywords.is_empty() {
        panic!("keyword catalog {} has no entries", catalog_path.display());
    }

    validate_entries(&catalog.keywords, &catalog_path);

    let mut output = String::new();
    writeln!(
        &mut output,
        "pub const SECRET_KEYWORDS: &[SecretKeyword] = &["
    )
    .unwrap();
    for entry in &catalog.keywords {
        writeln!(&mut output, "    SecretKeyword {{").unwrap();
        writeln!(&mut output, "        key: {},", rust_string(&entry.key)).unwrap();
        writeln!(
            &mut output,
            "        content_html: {},",
            rust_string(entry.content.trim())
        )
        .unwrap();
        writeln!(&mut output, "    }},").unwrap();
    }
    writeln!(&mut output, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_path = out_dir.join("keyword_catalog.rs");
    fs::write(&out_path, output).unwrap_or_else(|err| {
        panic!("failed to write {}: {err}", out_path.display())
    });
}

fn resolve_catalog_path(workspace_root: &Path) -> PathBuf {
    let env_value = env::var("KEYWORD_CATALOG_PATH").ok();
    let raw_path = match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => workspace_root.join("content/keywords.toml"),
    };
    if raw_path.is_relative() {
        workspace_root.join(raw_path)
    } else {
        raw_path
    }
}

fn rust_string(value: &str) -> String {
    format!("{:?}", value)
}

fn validate_entries(entries: &[KeywordEntry], catalog_path: &Path) {
    let mut keys = HashSet::new();

    for entry in entries {
        if entry.key.trim().is_empty() {
            panic!("keyword cannot be empty in {}", catalog_path.display());
        }
        if entry.key.chars().any(char::is_whitespace) {
            panic!(
                "keyword '{}' cannot contain whitespace in {}",
                entry.key,
                catalog_path.display()
            );
        }
        if entry.key != entry.key.to_lowercase() {
            panic!(
                "keyword '{}' must be lowercase in {}",
                entry.key,
                catalog_path.display()
            );
        }
        if entry.content.trim().is_empty() {
            panic!(
                "keyword '{}' has no content in {}",
                entry.key,
                catalog_path.display()
            );
        }
        if !keys.insert(entry.key.clone()) {
            panic!(
                "duplicate keyword '{}' in {}",
                entry.key,
                catalog_path.display()
            );
        }
    }
}
