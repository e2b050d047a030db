use std::path::PathBuf;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "youthroll", "Youthroll")
}

/// Hämta databassökväg
pub fn get_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("youthroll.db"))
        .unwrap_or_else(|| PathBuf::from("youthroll.db"))
}

/// Hämta sökväg till inställningsfilen
pub fn get_settings_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from("settings.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_names() {
        assert!(get_database_path().ends_with("youthroll.db"));
        assert!(get_settings_path().ends_with("settings.toml"));
    }
}
