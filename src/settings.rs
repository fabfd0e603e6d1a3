use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Theme assumed until a page reports its own.
    pub dark_theme: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_dir = lookup("COLOR_GENERATOR_DATA_DIR")
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
            .into();

        let dark_theme = lookup("COLOR_GENERATOR_DARK_THEME")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "dark"))
            .unwrap_or(false);

        Self {
            port,
            data_dir,
            dark_theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            settings(&[]),
            Settings {
                port: 8080,
                data_dir: PathBuf::from("./data"),
                dark_theme: false,
            }
        );
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("PORT", "3000"),
            ("COLOR_GENERATOR_DATA_DIR", "/var/lib/colors"),
            ("COLOR_GENERATOR_DARK_THEME", "True"),
        ]);
        assert_eq!(s.port, 3000);
        assert_eq!(s.data_dir, PathBuf::from("/var/lib/colors"));
        assert!(s.dark_theme);
    }

    #[test]
    fn test_bad_port_falls_back() {
        assert_eq!(settings(&[("PORT", "http")]).port, 8080);
    }
}
