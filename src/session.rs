//! CLIセッションファイル
//!
//! 直近の検索結果と作業リストを保存し、コマンドをまたいで選択を引き継ぐ。

use crate::error::{PcbInspectError, Result};
use pcb_inspect_common::{Lot, LotId, WorkingSet};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 直近の検索結果
    pub results: Vec<Lot>,
    /// 作業リスト
    pub working_set: WorkingSet,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            results: Vec::new(),
            working_set: WorkingSet::new(),
        }
    }
}

impl Session {
    const CURRENT_VERSION: u32 = 1;

    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::config::Config::config_dir()?.join(SESSION_FILE_NAME))
    }

    /// セッションを読み込み（無い・壊れている場合は空）
    pub fn load(path: &Path) -> Self {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        match serde_json::from_reader::<_, Session>(BufReader::new(file)) {
            Ok(session) if session.version == Self::CURRENT_VERSION => session,
            Ok(_) => {
                warn!("セッションのバージョン不一致、破棄します");
                Self::default()
            }
            Err(e) => {
                warn!("セッションの読み込みに失敗: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// 新しい検索結果を反映（作業リストは保持し、ハイライトだけ付け替える）
    pub fn set_results(&mut self, results: Vec<Lot>) {
        self.working_set.on_new_results(&results);
        self.results = results;
    }

    /// 検索結果上のチェック状態を反映
    pub fn select(&mut self, ids: &[LotId]) -> Result<()> {
        if let Some(unknown) = ids.iter().find(|id| !self.results.iter().any(|r| r.id == **id)) {
            return Err(PcbInspectError::NotFound(format!("検索結果にID {} がありません", unknown)));
        }
        self.working_set
            .apply_selection(&self.results, ids)
            .map_err(PcbInspectError::from_common)
    }

    /// 現在のチェックにIDを追加する
    pub fn add(&mut self, ids: &[LotId]) -> Result<()> {
        let mut selected = self.working_set.highlighted().to_vec();
        for id in ids {
            if !selected.contains(id) {
                selected.push(*id);
            }
        }
        self.select(&selected)
    }

    /// 作業リストから外す
    pub fn remove(&mut self, id: LotId) -> bool {
        self.working_set.remove(id)
    }

    pub fn clear(&mut self) {
        self.working_set.clear();
    }
}
