//! 数値列のソート設定（昇順 → 降順 → 解除）

use serde::{Deserialize, Serialize};

/// ソート可能な列
pub const SORTABLE_COLUMNS: [&str; 2] = ["afvi_ai_gv", "afvi_ai_longest"];

pub fn is_sortable(column: &str) -> bool {
    SORTABLE_COLUMNS.contains(&column)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown direction: {}. Use asc or desc", s)),
        }
    }
}

/// ソート設定（同時に1列のみ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortConfig {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: Some(field.into()),
            direction: Some(direction),
        }
    }

    pub fn is_active(&self) -> bool {
        self.field.is_some()
    }

    pub fn clear(&mut self) {
        self.field = None;
        self.direction = None;
    }

    /// 列ヘッダのクリック
    ///
    /// 別の列なら昇順から、同じ列なら 昇順 → 降順 → 解除 と巡回する。
    pub fn toggle(&mut self, field: &str) {
        if self.field.as_deref() != Some(field) {
            *self = Self::new(field, SortDirection::Asc);
            return;
        }

        match self.direction {
            Some(SortDirection::Asc) => self.direction = Some(SortDirection::Desc),
            _ => self.clear(),
        }
    }

    /// 指定列の現在の方向
    pub fn direction_for(&self, field: &str) -> Option<SortDirection> {
        if self.field.as_deref() == Some(field) {
            self.direction
        } else {
            None
        }
    }
}
