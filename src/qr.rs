//! Text payloads for QR codes.
//!
//! Only the encoded text is produced here; turning it into a bitmap is left to
//! whatever renders the code.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WifiSecurity {
    #[default]
    #[value(name = "WPA")]
    Wpa,
    #[value(name = "WEP")]
    Wep,
    #[value(name = "nopass")]
    NoPass,
}

impl WifiSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::NoPass => "nopass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    Url(String),
    Text(String),
    Wifi {
        ssid: String,
        password: String,
        security: WifiSecurity,
    },
}

impl QrPayload {
    /// The text to encode, or `None` when there is nothing to show.
    pub fn encode(&self) -> Option<String> {
        match self {
            QrPayload::Url(s) | QrPayload::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            QrPayload::Wifi {
                ssid,
                password,
                security,
            } => {
                if ssid.is_empty() {
                    return None;
                }
                Some(format!(
                    "WIFI:T:{};S:{};P:{};;",
                    security.as_str(),
                    escape_wifi(ssid),
                    escape_wifi(password)
                ))
            }
        }
    }
}

// Reserved characters in the WIFI: URI scheme.
fn escape_wifi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_text_are_trimmed() {
        assert_eq!(
            QrPayload::Url("  https://example.com \n".into()).encode(),
            Some("https://example.com".into())
        );
        assert_eq!(QrPayload::Text("   ".into()).encode(), None);
    }

    #[test]
    fn test_wifi_payload() {
        let payload = QrPayload::Wifi {
            ssid: "Home".into(),
            password: "s3cret".into(),
            security: WifiSecurity::Wpa,
        };
        assert_eq!(payload.encode(), Some("WIFI:T:WPA;S:Home;P:s3cret;;".into()));
    }

    #[test]
    fn test_wifi_escapes_reserved_characters() {
        let payload = QrPayload::Wifi {
            ssid: "Cafe;Bar".into(),
            password: "a:b\\c".into(),
            security: WifiSecurity::NoPass,
        };
        assert_eq!(
            payload.encode(),
            Some("WIFI:T:nopass;S:Cafe\\;Bar;P:a\\:b\\\\c;;".into())
        );
    }

    #[test]
    fn test_wifi_without_ssid_is_empty() {
        let payload = QrPayload::Wifi {
            ssid: String::new(),
            password: "x".into(),
            security: WifiSecurity::Wep,
        };
        assert_eq!(payload.encode(), None);
    }
}
