use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum ConvertError {
    XmlParse(quick_xml::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    PolylineDecode(String),
    /// Required structure absent or unparseable at call scope.
    MalformedInput { context: String },
    /// A geometry variant carried neither explicit coordinates nor an
    /// encoded string.
    MissingGeometry,
    /// A route leg had no usable coordinate source under strict policy.
    MissingLegData { index: usize },
    /// A response shape none of the converters recognize.
    UnsupportedRecord { kind: String },
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::Csv(e) => write!(f, "CSV parse error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::PolylineDecode(e) => write!(f, "Polyline decode error: {e}"),
            Self::MalformedInput { context } => write!(f, "Malformed input: {context}"),
            Self::MissingGeometry => write!(f, "Geometry has no coordinates or encoded polyline"),
            Self::MissingLegData { index } => {
                write!(f, "Leg {index} has no usable geometry or positions")
            }
            Self::UnsupportedRecord { kind } => write!(f, "Unsupported record: {kind}"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<quick_xml::Error> for ConvertError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<csv::Error> for ConvertError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ConvertError> for JsValue {
    fn from(e: ConvertError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
