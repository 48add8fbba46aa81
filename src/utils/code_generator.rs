use chrono::{DateTime, Utc};
use rand::Rng;

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Bank transfer reference: `VIR-YYYYMM-XXXXXX`.
///
/// The suffix avoids `0/O` and `1/I` so it survives being typed into a banking app.
pub fn generate_transfer_reference(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())] as char)
        .collect();
    format!("VIR-{}-{}", now.format("%Y%m"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_transfer_reference_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
        let reference = generate_transfer_reference(now);
        assert_eq!(reference.len(), "VIR-202503-".len() + 6);
        assert!(reference.starts_with("VIR-202503-"));
        assert!(
            reference["VIR-202503-".len()..]
                .bytes()
                .all(|b| REFERENCE_ALPHABET.contains(&b))
        );
    }
}
