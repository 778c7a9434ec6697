//! バックエンドクライアントの統合テスト
//!
//! モックサーバーに対して選択肢・検索・集計・画像の取得を検証

mod common;

use pcb_inspect::api::PmsClient;
use pcb_inspect::error::PcbInspectError;
use pcb_inspect_common::image::GerberQuery;
use pcb_inspect_common::{SearchQuery, SelectOption};
use std::time::Duration;

async fn client() -> (PmsClient, std::sync::Arc<common::MockState>) {
    let (base, state) = common::spawn_default().await;
    let client = PmsClient::new(base, Duration::from_secs(5)).expect("クライアント生成に失敗");
    (client, state)
}

#[tokio::test]
async fn test_cascade_options() {
    let (client, _) = client().await;

    let machines = client.machines().await.expect("設備一覧の取得に失敗");
    assert_eq!(machines, vec![SelectOption::new("M01V1"), SelectOption::new("M02V1")]);

    let items = client.items("M01V1").await.expect("品目一覧の取得に失敗");
    assert_eq!(items.len(), 2);
    assert_eq!(items[1], SelectOption::new("ITEM-B"), "labelが無い場合はvalueを使う");

    let lots = client.lots("ITEM-A").await.expect("ロット一覧の取得に失敗");
    assert_eq!(lots.len(), 2);
}

#[tokio::test]
async fn test_failed_list_degrades_to_empty() {
    let (client, _) = client().await;

    let strict = client.sorters("L001").await;
    assert!(matches!(strict, Err(PcbInspectError::Server { status: 500, .. })));

    assert!(client.sorters_or_empty("L001").await.is_empty(), "失敗時は空一覧");
}

#[tokio::test]
async fn test_search_sends_only_present_params() {
    let (client, state) = client().await;

    let query = SearchQuery::Filter {
        machine: Some("M01V1".into()),
        item: Some("ITEM-A".into()),
        lot: Some("L001".into()),
        trial: None,
    };
    let lots = client.search(&query).await.expect("検索に失敗");
    assert_eq!(lots.len(), 1);
    assert_eq!(lots[0].lot, "L001");
    assert_eq!(lots[0].inspection_date(), "2026-10-01");

    let sent = state.search_queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(sent.get("machine").map(String::as_str), Some("M01V1"));
    assert!(!sent.contains_key("trial"), "未指定のパラメータは送らない");
}

#[tokio::test]
async fn test_summary_multi_keeps_order_and_skips_null() {
    let (client, _) = client().await;

    let summaries = client.summary_multi(&[3, 2, 1]).await.expect("集計の取得に失敗");
    let lots: Vec<&str> = summaries.iter().map(|s| s.lot.as_str()).collect();
    assert_eq!(lots, vec!["L003", "L001"], "nullのロットは除外し指定順を保つ");
}

#[tokio::test]
async fn test_detail_header_not_found() {
    let (client, _) = client().await;

    let result = client.detail_header(999).await;
    assert!(matches!(result, Err(PcbInspectError::NotFound(_))));

    let header = client.detail_header(7).await.expect("ヘッダの取得に失敗");
    assert_eq!(header.lot, "L007");
}

#[tokio::test]
async fn test_detail_summary_sends_sorters() {
    let (client, state) = client().await;

    let summary = client
        .detail_summary(1, &["S01".into(), "S02".into()])
        .await
        .expect("サマリの取得に失敗");
    assert_eq!(summary.result_summary.len(), 3);

    let sent = state.summary_queries.lock().unwrap().last().cloned().unwrap();
    assert_eq!(sent.get("sorters").map(String::as_str), Some("S01,S02"));
}

#[tokio::test]
async fn test_image_and_gerber() {
    let (client, _) = client().await;

    let found = client.image("/data/L001/IMG_0001_Axial.png").await.expect("画像の取得に失敗");
    assert_eq!(found.as_deref(), Some(&[0x89u8, b'P', b'N', b'G'][..]));

    let missing = client.image("/data/L001/IMG_0001.png").await.expect("画像の取得に失敗");
    assert!(missing.is_none(), "404はNone");

    let query = GerberQuery {
        json_path: "gerber/1.json".into(),
        cx: "1.5".into(),
        cy: "2.5".into(),
        defect_width: "10".into(),
        defect_height: "12".into(),
    };
    let image = client.gerber(&query).await.expect("ガーバー画像の取得に失敗");
    assert_eq!(image.decode().unwrap().unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
}
