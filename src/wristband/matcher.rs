use super::ConnectedDevice;

/// Decides whether a live connection belongs to an order's wristband.
pub trait DeviceMatcher: Send + Sync {
    fn matches(&self, wristband_id: &str, device: &ConnectedDevice) -> bool;
}

/// Exact device name, or the wristband's suffix (label without the name
/// prefix) appearing anywhere in the device id.
///
/// Not unique: several devices can match, and the gateway takes the first
/// in connection order. An id equal to the bare prefix matches every device.
#[derive(Debug, Clone)]
pub struct NameOrSuffixMatcher {
    prefix: String,
}

impl NameOrSuffixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        NameOrSuffixMatcher {
            prefix: prefix.into(),
        }
    }
}

impl DeviceMatcher for NameOrSuffixMatcher {
    fn matches(&self, wristband_id: &str, device: &ConnectedDevice) -> bool {
        if device.name.as_deref() == Some(wristband_id) {
            return true;
        }
        let suffix = wristband_id.replacen(&self.prefix, "", 1);
        device.id.contains(&suffix)
    }
}
