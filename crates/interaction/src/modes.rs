use serde::{Deserialize, Serialize};

/// What a horizontal drag does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanX {
    None,
    #[default]
    TranslateX,
    RotateX,
}

/// What a vertical drag does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanY {
    None,
    #[default]
    TranslateY,
    RotateY,
}

/// What one wheel axis does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WheelMode {
    #[default]
    None,
    Zoom,
    RotateX,
    RotateY,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    X,
    Y,
}

impl PanX {
    pub fn is_active(self) -> bool {
        self != PanX::None
    }
}

impl PanY {
    pub fn is_active(self) -> bool {
        self != PanY::None
    }
}

#[cfg(test)]
mod tests {
    use super::{PanX, PanY, WheelMode};

    #[test]
    fn modes_use_option_names() {
        let p: PanX = serde_json::from_str("\"rotateX\"").unwrap();
        assert_eq!(p, PanX::RotateX);
        let p: PanY = serde_json::from_str("\"none\"").unwrap();
        assert!(!p.is_active());
        assert_eq!(serde_json::to_string(&WheelMode::Zoom).unwrap(), "\"zoom\"");
    }
}
