use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub type Label = u32;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ElementCenter {
    pub position: Position,   // 标注图像坐标（已按 scale 放大）
    pub tag: String,
    pub link: Option<String>,
}

/// label -> element, serialized as an object keyed by the decimal label.
/// A label is only meaningful together with the image it was drawn on.
pub type AnnotationMap = BTreeMap<Label, ElementCenter>;

#[derive(Clone, Debug)]
pub struct AnnotatedImage {
    pub image: Vec<u8>,
    pub map: AnnotationMap,
    pub width: u32,
    pub height: u32,
}

/// Reply of the decision service, kept field for field (explicit nulls and
/// fields this crate does not interpret included) so it can be handed back
/// unchanged once `elementPosition` is attached.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ActionSpec {
    #[serde(rename = "nextAction")]
    pub next_action: NextAction,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionSpec {
    pub fn brief_explanation(&self) -> Option<&str> {
        self.extra.get("briefExplanation")?.as_str()
    }
}

/// `nextAction` as sent by the decision service. Only typed through the
/// accessors; the raw object is what gets serialized.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct NextAction {
    fields: Map<String, Value>,
}

impl NextAction {
    pub fn action(&self) -> Option<&str> {
        self.fields.get("action")?.as_str()
    }

    /// Text to type; `None` when absent, null or not a string.
    pub fn text(&self) -> Option<&str> {
        self.fields.get("text")?.as_str()
    }

    pub fn element(&self) -> Option<&Value> {
        self.fields.get("element").filter(|v| !v.is_null())
    }

    pub fn element_position(&self) -> Option<Position> {
        Position::deserialize(self.fields.get("elementPosition")?).ok()
    }

    pub fn set_element_position(&mut self, position: Position) {
        self.fields
            .insert("elementPosition".to_string(), json!({"x": position.x, "y": position.y}));
    }

    /// The referenced label, accepting both `11` and `"11"`.
    pub fn label(&self) -> Option<Label> {
        match self.element()? {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    return Label::try_from(v).ok();
                }
                let f = n.as_f64()?;
                (f >= 0.0 && f.fract() == 0.0 && f <= Label::MAX as f64).then(|| f as Label)
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
