use crate::error::{AppError, Result};
use byte_unit::{Byte, Unit, UnitType};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct DefaultExclusions {
    #[serde(default)]
    pub names: Vec<String>,
}

static DEFAULT_EXCLUSIONS: Lazy<DefaultExclusions> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/default_exclusions.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/default_exclusions.yaml")
});

pub fn get_default_exclusions() -> &'static DefaultExclusions {
    &DEFAULT_EXCLUSIONS
}

/// Human-readable size with binary prefixes, two decimals, trailing zeros trimmed.
///
/// `0 -> "0 B"`, `1536 -> "1.5 KB"`, `1048576 -> "1 MB"`. Anything past
/// gibibytes is still expressed in GB.
pub fn format_size(size: u64) -> String {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

    if size == 0 {
        return "0 B".to_string();
    }

    let adjusted = Byte::from_u64(size).get_appropriate_unit(UnitType::Binary);
    let (value, label) = match adjusted.get_unit() {
        Unit::B => (size as f64, "B"),
        Unit::KiB => (adjusted.get_value(), "KB"),
        Unit::MiB => (adjusted.get_value(), "MB"),
        Unit::GiB => (adjusted.get_value(), "GB"),
        _ => (size as f64 / GIB, "GB"),
    };

    format!("{} {}", trim_decimals(value), label)
}

fn trim_decimals(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn serialize_to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String, AppError> {
    if pretty {
        serde_json::to_string_pretty(data).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(data).map_err(AppError::JsonSerialize)
    }
}

pub fn serialize_to_yaml<T: Serialize>(data: &T) -> Result<String, AppError> {
    serde_yml::to_string(data).map_err(AppError::YamlError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sizes_with_binary_prefixes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1), "1 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1 MB");
        assert_eq!(format_size(1_073_741_824), "1 GB");
    }

    #[test]
    fn rounds_to_two_decimals() {
        // 1100 / 1024 = 1.0742...
        assert_eq!(format_size(1100), "1.07 KB");
        // 5 TiB stays in GB.
        assert_eq!(format_size(5 * 1024 * 1_073_741_824), "5120 GB");
    }

    #[test]
    fn default_exclusions_are_embedded() {
        let defaults = get_default_exclusions();
        assert!(defaults.names.iter().any(|n| n == "node_modules"));
        assert!(defaults.names.iter().any(|n| n == ".git"));
    }
}
