//! Review result model and the response schema sent to the model.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;

/// One row of the review table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRow {
    /// 要求No (e.g. `REQ-001`)
    pub requirement_no: String,
    /// 要求内容 (ペルソナ: 指令)
    pub requirement_content: String,
    /// 〇 / △ / ×
    pub evaluation: String,
    pub compliance_location: String,
    pub compliance_reason: String,
    /// 修正案, including golden cases
    pub correction_plan: String,
    pub response_status: String,
    pub response_method: String,
}

/// Field name, Japanese description. Order is the column order of the report.
const FIELDS: [(&str, &str); 8] = [
    ("requirement_no", "要求No（例: REQ-001）"),
    ("requirement_content", "要求内容（ペルソナ: 指令）の詳細"),
    ("evaluation", "評価結果（〇/△/×のいずれか）"),
    ("compliance_location", "適合または不適合の箇所の参照"),
    ("compliance_reason", "適合または不適合と判断した理由"),
    ("correction_plan", "修正案の内容（ゴールデンケースを含む）"),
    ("response_status", "対応の有無"),
    ("response_method", "対応方法または非対応の理由"),
];

const ROWS_DESCRIPTION: &str = "評審結果のすべての行。**絶対に1行も省略してはいけない。**\
PDFに含まれるすべての要求項目を完全に抽出し、出力すること。\
途中で切らずに、最後の行まで必ず含めること。";

impl ReviewRow {
    /// Column headers of the result workbook, in field order.
    pub const HEADERS: [&'static str; 8] = [
        "要求No",
        "要求内容 (ペルソナ: 指令)",
        "評価 (〇/△/×)",
        "適合/不適合箇所",
        "適合/不適合理由",
        "修正案 (ゴールデンケースを含む)",
        "対応有無",
        "対応方法／非対応理由",
    ];

    /// Field values in header order.
    pub fn cells(&self) -> [&str; 8] {
        [
            &self.requirement_no,
            &self.requirement_content,
            &self.evaluation,
            &self.compliance_location,
            &self.compliance_reason,
            &self.correction_plan,
            &self.response_status,
            &self.response_method,
        ]
    }

    pub fn evaluation(&self) -> Evaluation {
        Evaluation::classify(&self.evaluation)
    }
}

/// The full review table returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTable {
    pub rows: Vec<ReviewRow>,
}

impl ReviewTable {
    pub fn new(rows: Vec<ReviewRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Response schema for Gemini structured output (OpenAPI subset).
    pub fn response_schema() -> Value {
        let mut properties = serde_json::Map::new();
        for (name, description) in FIELDS {
            properties.insert(
                name.to_string(),
                json!({ "type": "STRING", "description": description }),
            );
        }
        let names: Vec<&str> = FIELDS.iter().map(|(name, _)| *name).collect();

        json!({
            "type": "OBJECT",
            "properties": {
                "rows": {
                    "type": "ARRAY",
                    "description": ROWS_DESCRIPTION,
                    "items": {
                        "type": "OBJECT",
                        "properties": properties,
                        "required": names,
                        "propertyOrdering": names,
                    }
                }
            },
            "required": ["rows"],
        })
    }

    /// Count rows per evaluation class.
    pub fn summary(&self) -> EvaluationSummary {
        let mut summary = EvaluationSummary::default();
        for row in &self.rows {
            match row.evaluation() {
                Evaluation::Pass => summary.pass += 1,
                Evaluation::Partial => summary.partial += 1,
                Evaluation::Fail => summary.fail += 1,
                Evaluation::Other => summary.other += 1,
            }
        }
        summary
    }

    /// Load a review table saved as JSON.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save as pretty JSON, creating parent directories.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Evaluation mark of a review row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// 〇
    Pass,
    /// △
    Partial,
    /// ×
    Fail,
    Other,
}

impl Evaluation {
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text.starts_with(['〇', '○', '◯']) {
            Evaluation::Pass
        } else if text.starts_with(['△', '▲']) {
            Evaluation::Partial
        } else if text.starts_with(['×', '✕', '✖', 'X', 'x']) {
            Evaluation::Fail
        } else {
            Evaluation::Other
        }
    }
}

/// Row counts per [`Evaluation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub pass: usize,
    pub partial: usize,
    pub fail: usize,
    pub other: usize,
}

impl EvaluationSummary {
    pub fn total(&self) -> usize {
        self.pass + self.partial + self.fail + self.other
    }
}

impl std::fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "〇 {} / △ {} / × {}",
            self.pass, self.partial, self.fail
        )?;
        if self.other > 0 {
            write!(f, " / other {}", self.other)?;
        }
        Ok(())
    }
}
