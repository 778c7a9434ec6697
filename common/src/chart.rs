//! 分析チャート
//!
//! 作業リストのロット集計をグループ化し、棒/折れ線の組み合わせと軸配置を決める。
//! - 率（rate）はグループ内の算術平均、件数はグループ内の合計
//! - 同時に有効にできる指標は最大2つ
//! - 1指標なら棒/折れ線をユーザが選び、2指標なら1つ目が棒・2つ目が折れ線

use crate::error::{Error, Result};
use crate::types::MultiSummary;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 同時に選択できる指標の上限
pub const MAX_ACTIVE_METRICS: usize = 2;

/// グループ化の軸
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Lot,
    Version,
    Customer,
    Itemcode,
}

impl GroupBy {
    pub const ALL: [GroupBy; 4] = [GroupBy::Lot, GroupBy::Version, GroupBy::Customer, GroupBy::Itemcode];

    pub fn label(&self) -> &'static str {
        match self {
            GroupBy::Lot => "By LOT",
            GroupBy::Version => "By Version",
            GroupBy::Customer => "By Customer",
            GroupBy::Itemcode => "By Itemcode",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Lot => "lot",
            GroupBy::Version => "version",
            GroupBy::Customer => "customer",
            GroupBy::Itemcode => "itemcode",
        }
    }

    fn key_of(&self, s: &MultiSummary) -> String {
        let key = match self {
            GroupBy::Lot => Some(s.lot.as_str()),
            GroupBy::Version => s.version.as_deref(),
            GroupBy::Customer => s.customer.as_deref(),
            GroupBy::Itemcode => s.itemcode.as_deref(),
        };
        key.filter(|k| !k.is_empty()).unwrap_or("-").to_string()
    }
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lot" => Ok(GroupBy::Lot),
            "version" => Ok(GroupBy::Version),
            "customer" => Ok(GroupBy::Customer),
            "itemcode" | "item" => Ok(GroupBy::Itemcode),
            _ => Err(format!("Unknown group: {}. Use lot, version, customer, or itemcode", s)),
        }
    }
}

/// 分析指標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Rate,
    RateUnit,
    Overkill,
    Underkill,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Rate, Metric::RateUnit, Metric::Overkill, Metric::Underkill];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Rate => "Point-based Rate",
            Metric::RateUnit => "Unit-based Rate",
            Metric::Overkill => "Overkill(IVS)",
            Metric::Underkill => "Underkill(IVS)",
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rate" => Ok(Metric::Rate),
            "rate_unit" | "rate-unit" | "unit" => Ok(Metric::RateUnit),
            "overkill" => Ok(Metric::Overkill),
            "underkill" => Ok(Metric::Underkill),
            _ => Err(format!("Unknown metric: {}. Use rate, rate_unit, overkill, or underkill", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    #[default]
    Bar,
    Line,
}

impl GraphType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphType::Bar => "bar",
            GraphType::Line => "line",
        }
    }
}

impl std::str::FromStr for GraphType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bar" => Ok(GraphType::Bar),
            "line" => Ok(GraphType::Line),
            _ => Err(format!("Unknown graph type: {}. Use bar or line", s)),
        }
    }
}

/// 有効な指標（選択順ではなく固定順）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub rate: bool,
    pub rate_unit: bool,
    pub overkill: bool,
    pub underkill: bool,
}

impl AnalysisOptions {
    pub fn from_metrics(metrics: &[Metric]) -> Result<Self> {
        let mut options = Self::default();
        for m in metrics {
            if !options.is_active(*m) {
                options.toggle(*m)?;
            }
        }
        Ok(options)
    }

    pub fn is_active(&self, metric: Metric) -> bool {
        match metric {
            Metric::Rate => self.rate,
            Metric::RateUnit => self.rate_unit,
            Metric::Overkill => self.overkill,
            Metric::Underkill => self.underkill,
        }
    }

    pub fn selected(&self) -> Vec<Metric> {
        Metric::ALL.into_iter().filter(|m| self.is_active(*m)).collect()
    }

    /// チェックの切り替え。3つ目を有効にしようとした場合は変更せずにエラー
    pub fn toggle(&mut self, metric: Metric) -> Result<()> {
        let active = self.is_active(metric);
        if !active && self.selected().len() >= MAX_ACTIVE_METRICS {
            return Err(Error::TooManyOptions(MAX_ACTIVE_METRICS));
        }
        let slot = match metric {
            Metric::Rate => &mut self.rate,
            Metric::RateUnit => &mut self.rate_unit,
            Metric::Overkill => &mut self.overkill,
            Metric::Underkill => &mut self.underkill,
        };
        *slot = !active;
        Ok(())
    }

    /// 実行前の検証（1〜2個）
    pub fn validate(&self) -> Result<()> {
        match self.selected().len() {
            0 => Err(Error::NoOptionSelected),
            n if n > MAX_ACTIVE_METRICS => Err(Error::TooManyOptions(MAX_ACTIVE_METRICS)),
            _ => Ok(()),
        }
    }

    pub fn has_rate(&self) -> bool {
        self.rate || self.rate_unit
    }

    /// 指標ごとの描画タイプ
    pub fn graph_type(&self, metric: Metric, single: GraphType) -> GraphType {
        let selected = self.selected();
        match selected.len() {
            1 => single,
            2 if selected[1] == metric => GraphType::Line,
            _ => GraphType::Bar,
        }
    }
}

/// グループごとの集計値（率は%、アンダーキルはppm）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedPoint {
    pub key: String,
    pub lots: usize,
    pub ok: f64,
    pub ng: f64,
    pub unk: f64,
    pub ok_unit: f64,
    pub ng_unit: f64,
    pub unk_unit: f64,
    pub over: f64,
    pub under: f64,
    pub ok_cnt: u64,
    pub ng_cnt: u64,
    pub unk_cnt: u64,
    pub overk_cnt: u64,
    pub underk_cnt: u64,
}

/// ロット集計をグループ化する（グループの並びは初出順）
pub fn group_summaries(summaries: &[MultiSummary], group_by: GroupBy) -> Vec<GroupedPoint> {
    let mut groups: Vec<(String, Vec<&MultiSummary>)> = Vec::new();
    for s in summaries {
        let key = group_by.key_of(s);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(s),
            None => groups.push((key, vec![s])),
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let n = members.len() as f64;
            let avg = |f: fn(&MultiSummary) -> f64| members.iter().map(|m| f(m)).sum::<f64>() / n;
            let sum = |f: fn(&MultiSummary) -> u64| members.iter().map(|m| f(m)).sum::<u64>();

            GroupedPoint {
                key,
                lots: members.len(),
                ok: avg(|m| m.ok_rate * 100.0),
                ng: avg(|m| m.ng_rate * 100.0),
                unk: avg(|m| m.unk_rate * 100.0),
                ok_unit: avg(|m| m.unit_ok_rate * 100.0),
                ng_unit: avg(|m| m.unit_ng_rate * 100.0),
                unk_unit: avg(|m| m.unit_unk_rate * 100.0),
                over: avg(|m| m.overk_rate * 100.0),
                under: avg(|m| m.underk_ppm),
                ok_cnt: sum(|m| m.ok_cnt),
                ng_cnt: sum(|m| m.ng_cnt),
                unk_cnt: sum(|m| m.unk_cnt),
                overk_cnt: sum(|m| m.overk_cnt),
                underk_cnt: sum(|m| m.underk_cnt),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    Percentage,
    Overkill,
    Ppm,
}

impl AxisId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisId::Percentage => "percentage",
            AxisId::Overkill => "overkill",
            AxisId::Ppm => "ppm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub id: AxisId,
    pub position: AxisPosition,
    pub title: &'static str,
    /// 率軸のみ 0〜100 に固定
    pub range: Option<(f64, f64)>,
    /// 補助軸はグリッド線を描かない
    pub draw_grid: bool,
}

/// 軸の配置
///
/// - 率指標があれば左に % 軸
/// - オーバーキルは独自の軸。左が空いていれば左、% 軸があれば右
/// - アンダーキル（ppm）は常に右の専用軸
pub fn axes(options: &AnalysisOptions) -> Vec<Axis> {
    let mut axes = Vec::new();
    let has_rate = options.has_rate();

    if has_rate {
        axes.push(Axis {
            id: AxisId::Percentage,
            position: AxisPosition::Left,
            title: "% (Rate)",
            range: Some((0.0, 100.0)),
            draw_grid: true,
        });
    }

    if options.overkill {
        axes.push(Axis {
            id: AxisId::Overkill,
            position: if has_rate { AxisPosition::Right } else { AxisPosition::Left },
            title: "Overkill (%)",
            range: None,
            draw_grid: false,
        });
    }

    if options.underkill {
        axes.push(Axis {
            id: AxisId::Ppm,
            position: AxisPosition::Right,
            title: "Underkill (ppm)",
            range: None,
            draw_grid: false,
        });
    }

    axes
}

/// 系列の色
pub mod palette {
    pub const RATE_OK: &str = "#7da87a";
    pub const RATE_UNK: &str = "#d8a15c";
    pub const RATE_NG: &str = "#c76a6a";
    pub const UNIT_OK: &str = "#a7c8a3";
    pub const UNIT_UNK: &str = "#e8c48f";
    pub const UNIT_NG: &str = "#dfa3a3";
    pub const OVERKILL: &str = "#9b9fa8";
    pub const UNDERKILL: &str = "#b59bc9";
}

/// 系列の種類（ツールチップの書式に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Ok,
    Unk,
    Ng,
    UnitOk,
    UnitUnk,
    UnitNg,
    Overkill,
    Underkill,
}

impl SeriesKind {
    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::Ok => "OK (%)",
            SeriesKind::Unk => "UNK (%)",
            SeriesKind::Ng => "NG (%)",
            SeriesKind::UnitOk => "Unit OK (%)",
            SeriesKind::UnitUnk => "Unit UNK (%)",
            SeriesKind::UnitNg => "Unit NG (%)",
            SeriesKind::Overkill => "OVERKILL (%)",
            SeriesKind::Underkill => "UNDERKILL (ppm)",
        }
    }

    fn value(&self, g: &GroupedPoint) -> f64 {
        match self {
            SeriesKind::Ok => g.ok,
            SeriesKind::Unk => g.unk,
            SeriesKind::Ng => g.ng,
            SeriesKind::UnitOk => g.ok_unit,
            SeriesKind::UnitUnk => g.unk_unit,
            SeriesKind::UnitNg => g.ng_unit,
            SeriesKind::Overkill => g.over,
            SeriesKind::Underkill => g.under,
        }
    }

    /// ツールチップ文字列
    pub fn tooltip(&self, value: f64, g: &GroupedPoint) -> String {
        let label = self.label();
        match self {
            SeriesKind::Ok => format!("{}: {:.1}% | CNT: {}", label, value, group_thousands(g.ok_cnt)),
            SeriesKind::Ng => format!("{}: {:.1}% | CNT: {}", label, value, group_thousands(g.ng_cnt)),
            SeriesKind::Unk => format!("{}: {:.1}% | CNT: {}", label, value, group_thousands(g.unk_cnt)),
            SeriesKind::UnitOk | SeriesKind::UnitUnk | SeriesKind::UnitNg => {
                format!("{}: {:.1}%", label, value)
            }
            SeriesKind::Overkill => format!("{:.1}% | CNT: {}", value, group_thousands(g.overk_cnt)),
            SeriesKind::Underkill => format!(
                "{} ppm | CNT: {}",
                group_thousands(value.round() as u64),
                group_thousands(g.underk_cnt)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub kind: SeriesKind,
    pub label: &'static str,
    pub data: Vec<f64>,
    pub color: &'static str,
    pub graph_type: GraphType,
    pub axis: AxisId,
    /// 折れ線を棒の手前に描く
    pub order: u8,
}

/// チャート全体の定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub axes: Vec<Axis>,
    pub groups: Vec<GroupedPoint>,
}

impl ChartSpec {
    pub fn build(
        summaries: &[MultiSummary],
        group_by: GroupBy,
        options: &AnalysisOptions,
        single: GraphType,
    ) -> Self {
        let groups = group_summaries(summaries, group_by);
        let mut datasets = Vec::new();

        let series: [(Metric, &[(SeriesKind, &'static str)], AxisId); 4] = [
            (
                Metric::Rate,
                &[
                    (SeriesKind::Ok, palette::RATE_OK),
                    (SeriesKind::Unk, palette::RATE_UNK),
                    (SeriesKind::Ng, palette::RATE_NG),
                ],
                AxisId::Percentage,
            ),
            (
                Metric::RateUnit,
                &[
                    (SeriesKind::UnitOk, palette::UNIT_OK),
                    (SeriesKind::UnitUnk, palette::UNIT_UNK),
                    (SeriesKind::UnitNg, palette::UNIT_NG),
                ],
                AxisId::Percentage,
            ),
            (Metric::Overkill, &[(SeriesKind::Overkill, palette::OVERKILL)], AxisId::Overkill),
            (Metric::Underkill, &[(SeriesKind::Underkill, palette::UNDERKILL)], AxisId::Ppm),
        ];

        for (metric, kinds, axis) in series {
            if !options.is_active(metric) {
                continue;
            }
            let graph_type = options.graph_type(metric, single);
            for (kind, color) in kinds {
                datasets.push(Dataset {
                    kind: *kind,
                    label: kind.label(),
                    data: groups.iter().map(|g| kind.value(g)).collect(),
                    color,
                    graph_type,
                    axis,
                    order: if graph_type == GraphType::Line { 0 } else { 1 },
                });
            }
        }

        Self {
            labels: groups.iter().map(|g| g.key.clone()).collect(),
            datasets,
            axes: axes(options),
            groups,
        }
    }

    /// Chart.js 互換の設定オブジェクト
    pub fn to_chartjs_config(&self) -> Value {
        let datasets: Vec<Value> = self
            .datasets
            .iter()
            .map(|d| {
                let is_bar = d.graph_type == GraphType::Bar;
                json!({
                    "label": d.label,
                    "data": d.data,
                    "type": d.graph_type.as_str(),
                    "backgroundColor": if is_bar { d.color } else { "transparent" },
                    "borderColor": d.color,
                    "borderWidth": 2,
                    "maxBarThickness": 40,
                    "yAxisID": d.axis.as_str(),
                    "order": d.order,
                    "tooltips": d.data.iter().zip(&self.groups).map(|(v, g)| d.kind.tooltip(*v, g)).collect::<Vec<_>>(),
                })
            })
            .collect();

        let mut scales = serde_json::Map::new();
        for axis in &self.axes {
            let mut scale = json!({
                "type": "linear",
                "position": match axis.position { AxisPosition::Left => "left", AxisPosition::Right => "right" },
                "title": { "display": true, "text": axis.title },
            });
            if let Some((min, max)) = axis.range {
                scale["min"] = json!(min);
                scale["max"] = json!(max);
            }
            if !axis.draw_grid {
                scale["grid"] = json!({ "drawOnChartArea": false });
            }
            scales.insert(axis.id.as_str().to_string(), scale);
        }

        json!({
            "type": "bar",
            "data": { "labels": self.labels, "datasets": datasets },
            "options": {
                "maintainAspectRatio": false,
                "responsive": true,
                "plugins": { "legend": { "position": "bottom" } },
                "scales": Value::Object(scales),
            }
        })
    }
}

/// 3桁区切り
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
