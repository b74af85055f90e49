use std::sync::OnceLock;

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(default)
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}

// Accepts "C000", "0xC000" and "$C000".
fn env_hex_u16(key: &str) -> Option<u16> {
    let value = std::env::var(key).ok()?;
    let digits = value
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .trim_start_matches('$');
    u16::from_str_radix(digits, 16).ok()
}

/// Suppresses the CLI banner and summary.
pub fn quiet() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| env_flag("QUIET", false))
}

/// Logs every instruction at info level instead of trace.
pub fn trace() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| env_flag("DEBUG_TRACE", false))
}

/// Starts at $C000 with P=$24, nestest's automated mode.
pub fn nestest_auto() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| env_flag("NESTEST_AUTO", false))
}

pub fn max_steps() -> Option<u64> {
    static VALUE: OnceLock<Option<u64>> = OnceLock::new();
    *VALUE.get_or_init(|| env_u64("MAX_STEPS").filter(|&n| n > 0))
}

/// Overrides the reset vector.
pub fn start_pc() -> Option<u16> {
    static VALUE: OnceLock<Option<u16>> = OnceLock::new();
    *VALUE.get_or_init(|| env_hex_u16("START_PC"))
}

pub fn nestest_log() -> Option<String> {
    static VALUE: OnceLock<Option<String>> = OnceLock::new();
    VALUE
        .get_or_init(|| std::env::var("NESTEST_LOG").ok().filter(|p| !p.is_empty()))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_prefixes() {
        std::env::set_var("NES_CPU_TEST_PC_A", "0xC000");
        std::env::set_var("NES_CPU_TEST_PC_B", "$c5f5");
        std::env::set_var("NES_CPU_TEST_PC_C", "zz");
        assert_eq!(env_hex_u16("NES_CPU_TEST_PC_A"), Some(0xC000));
        assert_eq!(env_hex_u16("NES_CPU_TEST_PC_B"), Some(0xC5F5));
        assert_eq!(env_hex_u16("NES_CPU_TEST_PC_C"), None);
        assert_eq!(env_hex_u16("NES_CPU_TEST_PC_UNSET"), None);
    }

    #[test]
    fn test_flag_spellings() {
        std::env::set_var("NES_CPU_TEST_FLAG", "on");
        assert!(env_flag("NES_CPU_TEST_FLAG", false));
        std::env::set_var("NES_CPU_TEST_FLAG", "0");
        assert!(!env_flag("NES_CPU_TEST_FLAG", true));
        assert!(env_flag("NES_CPU_TEST_FLAG_UNSET", true));
    }
}
