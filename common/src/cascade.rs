//! 検索条件（メーカー → 設備 → 品目 → ロット の連動選択）
//!
//! 上位の選択が変わると下位の選択と候補をリセットする。
//! 期間＋テキストのポップアップ検索は連動選択を経由しない別経路。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::export::format_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vendor {
    Ati,
    Pixel,
}

impl Vendor {
    pub const ALL: [Vendor; 2] = [Vendor::Ati, Vendor::Pixel];

    /// 検索に対応しているか（PIXEL は選択不可）
    pub fn is_supported(&self) -> bool {
        matches!(self, Vendor::Ati)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Vendor::Ati => "ATI",
            Vendor::Pixel => "PIXEL",
        }
    }
}

impl std::str::FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ATI" => Ok(Vendor::Ati),
            "PIXEL" => Ok(Vendor::Pixel),
            _ => Err(format!("Unknown vendor: {}. Use ATI or PIXEL", s)),
        }
    }
}

/// 期間（両端含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// `YYYY-MM-DD ~ YYYY-MM-DD`
    pub fn label(&self) -> String {
        format!("{} ~ {}", format_date(self.start), format_date(self.end))
    }

    pub fn parse_label(label: &str) -> Option<Self> {
        let (s, e) = label.split_once('~')?;
        let start = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(e.trim(), "%Y-%m-%d").ok()?;
        Some(Self { start, end })
    }
}

/// `GET /api/pms/search` のクエリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Filter {
        machine: Option<String>,
        item: Option<String>,
        lot: Option<String>,
        trial: Option<String>,
    },
    Popup {
        range: DateRange,
        text: String,
    },
}

impl SearchQuery {
    /// 値の無いパラメータは送らない
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            SearchQuery::Filter { machine, item, lot, trial } => [
                ("machine", machine),
                ("item", item),
                ("lot", lot),
                ("trial", trial),
            ]
            .into_iter()
            .filter_map(|(k, v)| v.clone().map(|v| (k, v)))
            .collect(),
            SearchQuery::Popup { range, text } => vec![
                ("startDate", format_date(range.start)),
                ("endDate", format_date(range.end)),
                ("text", text.clone()),
            ],
        }
    }
}

/// 呼び出し側が実行するI/O
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEffect {
    LoadMachines,
    LoadItems { machine: String },
    LoadLots { item: String },
    ClearResults,
    Search(SearchQuery),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeState {
    vendor: Option<Vendor>,
    machine: Option<String>,
    item: Option<String>,
    lot: Option<String>,
    machines: Vec<String>,
    items: Vec<String>,
    lots: Vec<String>,
    popup_range: Option<DateRange>,
    popup_text: String,
}

impl CascadeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vendor(&self) -> Option<Vendor> {
        self.vendor
    }

    pub fn machine(&self) -> Option<&str> {
        self.machine.as_deref()
    }

    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    pub fn lot(&self) -> Option<&str> {
        self.lot.as_deref()
    }

    pub fn machines(&self) -> &[String] {
        &self.machines
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn lots(&self) -> &[String] {
        &self.lots
    }

    pub fn machine_enabled(&self) -> bool {
        self.vendor.is_some()
    }

    pub fn item_enabled(&self) -> bool {
        self.machine.is_some()
    }

    pub fn lot_enabled(&self) -> bool {
        self.item.is_some()
    }

    pub fn set_machines(&mut self, machines: Vec<String>) {
        self.machines = machines;
    }

    /// 品目候補の反映（選択中の設備と一致する場合のみ）
    pub fn set_items(&mut self, machine: &str, items: Vec<String>) -> bool {
        if self.machine.as_deref() != Some(machine) {
            return false;
        }
        self.items = items;
        true
    }

    pub fn set_lots(&mut self, item: &str, lots: Vec<String>) -> bool {
        if self.item.as_deref() != Some(item) {
            return false;
        }
        self.lots = lots;
        true
    }

    /// メーカー選択。未対応メーカーは無視する
    pub fn select_vendor(&mut self, vendor: Vendor) -> Vec<CascadeEffect> {
        if !vendor.is_supported() {
            return Vec::new();
        }
        self.vendor = Some(vendor);
        self.machine = None;
        self.item = None;
        self.lot = None;
        self.items.clear();
        self.lots.clear();

        let mut effects = Vec::new();
        if self.machines.is_empty() {
            effects.push(CascadeEffect::LoadMachines);
        }
        effects.push(CascadeEffect::ClearResults);
        effects
    }

    pub fn select_machine(&mut self, machine: impl Into<String>) -> Vec<CascadeEffect> {
        if self.vendor.is_none() {
            return Vec::new();
        }
        let machine = machine.into();
        self.machine = Some(machine.clone());
        self.item = None;
        self.lot = None;
        self.items.clear();
        self.lots.clear();
        vec![CascadeEffect::LoadItems { machine }, CascadeEffect::ClearResults]
    }

    pub fn select_item(&mut self, item: impl Into<String>) -> Vec<CascadeEffect> {
        if self.machine.is_none() {
            return Vec::new();
        }
        let item = item.into();
        self.item = Some(item.clone());
        self.lot = None;
        self.lots.clear();
        vec![CascadeEffect::LoadLots { item }, CascadeEffect::ClearResults]
    }

    /// ロット選択。対応メーカーなら検索まで行う
    pub fn select_lot(&mut self, lot: impl Into<String>) -> Vec<CascadeEffect> {
        if self.item.is_none() {
            return Vec::new();
        }
        self.lot = Some(lot.into());
        match (self.vendor, self.filter_query()) {
            (Some(v), Some(query)) if v.is_supported() => vec![CascadeEffect::Search(query)],
            _ => Vec::new(),
        }
    }

    /// 連動選択からの検索条件
    pub fn filter_query(&self) -> Option<SearchQuery> {
        self.vendor?;
        Some(SearchQuery::Filter {
            machine: self.machine.clone(),
            item: self.item.clone(),
            lot: self.lot.clone(),
            trial: None,
        })
    }

    /// ポップアップを開く（品目・ロット・テキストをリセットし期間は今日）
    pub fn open_popup(&mut self, today: NaiveDate) -> bool {
        if self.vendor.is_none() {
            return false;
        }
        self.item = None;
        self.lot = None;
        self.lots.clear();
        self.popup_text.clear();
        self.popup_range = Some(DateRange::single(today));
        true
    }

    pub fn popup_label(&self) -> Option<String> {
        self.popup_range.map(|r| r.label())
    }

    pub fn set_popup_range(&mut self, range: DateRange) {
        self.popup_range = Some(range);
    }

    pub fn set_popup_text(&mut self, text: impl Into<String>) {
        self.popup_text = text.into();
    }

    pub fn popup_text(&self) -> &str {
        &self.popup_text
    }

    pub fn popup_query(&self) -> Option<SearchQuery> {
        self.vendor?;
        Some(SearchQuery::Popup {
            range: self.popup_range?,
            text: self.popup_text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn test_cascade_resets_lower_levels() {
        let mut c = CascadeState::new();
        assert_eq!(
            c.select_vendor(Vendor::Ati),
            vec![CascadeEffect::LoadMachines, CascadeEffect::ClearResults]
        );
        c.set_machines(vec!["M1".into()]);
        c.select_machine("M1");
        assert!(c.set_items("M1", vec!["I1".into()]));
        c.select_item("I1");
        assert!(c.set_lots("I1", vec!["L1".into()]));

        let effects = c.select_machine("M2");
        assert_eq!(
            effects,
            vec![CascadeEffect::LoadItems { machine: "M2".into() }, CascadeEffect::ClearResults]
        );
        assert_eq!(c.item(), None);
        assert!(c.items().is_empty());
        assert!(c.lots().is_empty());
        assert!(!c.set_items("M1", vec!["stale".into()]));
    }

    #[test]
    fn test_lot_selection_searches() {
        let mut c = CascadeState::new();
        c.select_vendor(Vendor::Ati);
        c.select_machine("M1");
        c.select_item("I1");
        let effects = c.select_lot("L1");
        let CascadeEffect::Search(query) = &effects[0] else {
            panic!("expected search");
        };
        assert_eq!(
            query.params(),
            vec![("machine", "M1".to_string()), ("item", "I1".to_string()), ("lot", "L1".to_string())]
        );
    }

    #[test]
    fn test_pixel_is_disabled() {
        let mut c = CascadeState::new();
        assert!(c.select_vendor(Vendor::Pixel).is_empty());
        assert_eq!(c.vendor(), None);
        assert!(c.select_machine("M1").is_empty());
    }

    #[test]
    fn test_popup_search() {
        let mut c = CascadeState::new();
        assert!(!c.open_popup(day(5)));
        c.select_vendor(Vendor::Ati);
        c.select_machine("M1");
        c.select_item("I1");
        c.set_popup_text("old");
        assert!(c.open_popup(day(5)));
        assert_eq!(c.item(), None);
        assert_eq!(c.popup_text(), "");
        assert_eq!(c.popup_label().unwrap(), "2026-01-05 ~ 2026-01-05");

        c.set_popup_range(DateRange { start: day(1), end: day(7) });
        c.set_popup_text("LOT-A");
        assert_eq!(
            c.popup_query().unwrap().params(),
            vec![
                ("startDate", "2026-01-01".to_string()),
                ("endDate", "2026-01-07".to_string()),
                ("text", "LOT-A".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_label() {
        let r = DateRange::parse_label("2026-01-01 ~ 2026-01-07").unwrap();
        assert_eq!(r, DateRange { start: day(1), end: day(7) });
        assert!(DateRange::parse_label("yesterday").is_none());
    }
}
