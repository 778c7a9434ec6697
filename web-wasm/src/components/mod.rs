//! UIコンポーネント

pub mod analysis_chart;
pub mod excel_table;
pub mod export_dialog;
pub mod filter_bar;
pub mod header;
pub mod image_modal;
pub mod pagination;
pub mod progress_overlay;
pub mod results_table;
pub mod selected_lots;
pub mod summary_view;
