use serde_derive::Serialize;

/// Hardware addresses currently visible on the network.
///
/// Always trimmed, de-duplicated and sorted ascending, so two sets built from
/// the same members compare equal regardless of the order they were listed in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceSet(Vec<String>);

impl DeviceSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for DeviceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut devices: Vec<String> = iter
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        devices.sort();
        devices.dedup();
        DeviceSet(devices)
    }
}

/// Payload of the `device` topic.
#[derive(Debug, Serialize)]
pub struct DevicePublication {
    pub ip_address: String,
    pub mac_address: String,
    pub devices: DeviceSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_set_is_canonical() {
        let set: DeviceSet = [
            "bb:00:00:00:00:02\n",
            "aa:00:00:00:00:01",
            "  ",
            "bb:00:00:00:00:02",
        ]
        .into_iter()
        .collect();
        assert_eq!(
            set.as_slice(),
            &["aa:00:00:00:00:01".to_string(), "bb:00:00:00:00:02".to_string()]
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a: DeviceSet = ["b", "a", "c"].into_iter().collect();
        let b: DeviceSet = ["c", "b", "a"].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_publication_wire_shape() {
        let publication = DevicePublication {
            ip_address: "192.168.1.10".to_string(),
            mac_address: "de:ad:be:ef:00:01".to_string(),
            devices: ["bb:bb:bb:bb:bb:bb", "aa:aa:aa:aa:aa:aa"].into_iter().collect(),
        };
        let value = serde_json::to_value(&publication).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ip_address": "192.168.1.10",
                "mac_address": "de:ad:be:ef:00:01",
                "devices": ["aa:aa:aa:aa:aa:aa", "bb:bb:bb:bb:bb:bb"],
            })
        );
    }
}
