//! テスト用のモックバックエンド（/api/pms）

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 詳細テーブルの総件数
pub const TOTAL_ROWS: u64 = 250;

/// エクスポートの本文サイズ
pub const EXPORT_SIZE: usize = 64 * 1024;

#[derive(Default)]
pub struct MockState {
    pub data_requests: Mutex<Vec<Value>>,
    pub summary_queries: Mutex<Vec<HashMap<String, String>>>,
    pub unique_requests: AtomicUsize,
    pub search_queries: Mutex<Vec<HashMap<String, String>>>,
    pub export_bodies: Mutex<Vec<Value>>,
    /// エクスポートの応答を止める
    pub slow_export: bool,
}

impl MockState {
    pub fn data_count(&self) -> usize {
        self.data_requests.lock().unwrap().len()
    }

    pub fn last_data_request(&self) -> Value {
        self.data_requests.lock().unwrap().last().cloned().unwrap_or(Value::Null)
    }
}

type Shared = Arc<MockState>;

/// 127.0.0.1 の空きポートで起動し、ベースURLを返す
pub async fn spawn(state: Shared) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.ok();
    });
    format!("http://{}", addr)
}

/// ヘッダまで読んだら固定の応答を書いて切断する生TCPサーバ
///
/// axum では作れない不正な応答（本文と合わない Content-Length など）の確認用。
pub async fn spawn_raw(response: &'static [u8]) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind raw server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            socket.write_all(response).await.ok();
            socket.shutdown().await.ok();
        }
    });
    format!("http://{}", addr)
}

pub async fn spawn_default() -> (String, Shared) {
    let state = Arc::new(MockState::default());
    (spawn(state.clone()).await, state)
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/pms/machines", get(machines))
        .route("/api/pms/items", get(items))
        .route("/api/pms/lots", get(lots))
        .route("/api/pms/sorter", get(broken))
        .route("/api/pms/search", get(search))
        .route("/api/pms/detail/:id", get(detail_header))
        .route("/api/pms/detail/:id/summary", get(detail_summary))
        .route("/api/pms/detail/:id/sorter", get(detail_sorters))
        .route("/api/pms/detail/:id/unique-values", get(unique_values))
        .route("/api/pms/detail/:id/data", post(detail_data))
        .route("/api/pms/summary/multi", post(summary_multi))
        .route("/api/pms/download-zip", post(download))
        .route("/image/gerber", get(gerber))
        .route("/images/*path", get(image))
        .with_state(state)
}

async fn machines() -> Json<Value> {
    Json(json!(["M01V1", "M02V1"]))
}

async fn items(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    match q.get("machine").map(String::as_str) {
        Some("M01V1") => Json(json!([{"value": "ITEM-A", "label": "ITEM-A"}, {"value": "ITEM-B"}])),
        _ => Json(json!([])),
    }
}

async fn lots(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    match q.get("item").map(String::as_str) {
        Some("ITEM-A") => Json(json!(["L001", "L002"])),
        _ => Json(json!([])),
    }
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "db down").into_response()
}

pub fn lot_json(id: i64) -> Value {
    json!({
        "id": id,
        "lot": format!("L{:03}", id),
        "itemcode": "ITEM-A",
        "version": "V1",
        "customer": "CUST",
        "machine": "M01V1",
        "trial": "1",
        "ai_dt": "2026-10-01 12:00:00"
    })
}

async fn search(State(s): State<Shared>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    s.search_queries.lock().unwrap().push(q.clone());
    if q.get("lot").map(String::as_str) == Some("L001") {
        return Json(json!([lot_json(1)]));
    }
    Json(json!((1..=3).map(lot_json).collect::<Vec<_>>()))
}

async fn detail_header(Path(id): Path<i64>) -> Response {
    if id == 999 {
        return (StatusCode::NOT_FOUND, "no such lot").into_response();
    }
    Json(json!({
        "test_id": id,
        "lot": format!("L{:03}", id),
        "machine": "M01V1",
        "customer": "CUST",
        "itemcode": "ITEM-A",
        "version": "V1",
        "ai_date_time": "2026-10-01 12:00:00"
    }))
    .into_response()
}

async fn detail_summary(
    State(s): State<Shared>,
    Path(_id): Path<i64>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Value> {
    s.summary_queries.lock().unwrap().push(q);
    Json(json!({
        "resultSummary": [
            {"type": "OK", "count": 90, "rate": "90.00%"},
            {"type": "NG", "count": 10, "rate": "10.00%"},
            {"type": "TOTAL", "count": 100, "rate": "100.00%"}
        ],
        "gtSummary": [{"type": "UnderKill", "count": 1, "rate": "10000"}]
    }))
}

async fn detail_sorters(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!([{"value": "S01", "label": "Sorter 1"}, {"value": "S02", "label": "Sorter 2"}]))
}

async fn unique_values(State(s): State<Shared>, Path(_id): Path<i64>) -> Json<Value> {
    s.unique_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "defect_code": ["A1", "B2", "C3"],
        "strip_id": ["1", "2"]
    }))
}

fn row_json(n: u64) -> Value {
    json!({
        "strip_id": (n % 2 + 1).to_string(),
        "defect_code": "A1",
        "afvi_ai_keyin": "OK",
        "afvi_ai_defect": "SCRATCH",
        "afvi_false_defect": null,
        "afvi_clf_defect": "C",
        "afvi_ai_longest": n as f64 * 0.5,
        "afvi_ai_gv": n,
        "ivs_keyin1": "OK",
        "image_path": format!("/data/L001/IMG_{:04}_Pad.png", n),
        "file_name": format!("gerber/{}.json", n),
        "rel_x_unit": 1.5,
        "rel_y_unit": 2.5,
        "defect_width": 10,
        "defect_height": 12
    })
}

async fn detail_data(State(s): State<Shared>, Path(_id): Path<i64>, Json(body): Json<Value>) -> Json<Value> {
    s.data_requests.lock().unwrap().push(body.clone());
    let page = body["page"].as_u64().unwrap_or(1);
    let size = body["size"].as_u64().unwrap_or(100);
    let start = (page - 1) * size;
    let end = (start + size).min(TOTAL_ROWS);
    let rows: Vec<Value> = (start..end).map(|n| row_json(n + 1)).collect();
    Json(json!({
        "mode": body["mode"],
        "page": page,
        "pageSize": size,
        "total": TOTAL_ROWS,
        "hasMore": end < TOTAL_ROWS,
        "rows": rows
    }))
}

fn multi_json(id: i64, version: &str) -> Value {
    json!({
        "lot": format!("L{:03}", id),
        "version": version,
        "total": 1000, "ok_cnt": 900, "ng_cnt": 50, "unk_cnt": 50,
        "ok_rate": 0.9, "ng_rate": 0.05, "unk_rate": 0.05,
        "unit_ok_rate": 0.8, "unit_ng_rate": 0.1, "unit_unk_rate": 0.1,
        "underk_cnt": 2, "underk_ppm": 2000.0,
        "overk_cnt": 5, "overk_rate": 0.5
    })
}

async fn summary_multi(Json(ids): Json<Vec<i64>>) -> Json<Value> {
    let mut map = serde_json::Map::new();
    for id in ids {
        let value = if id == 2 { Value::Null } else { multi_json(id, "V1") };
        map.insert(id.to_string(), value);
    }
    Json(Value::Object(map))
}

async fn download(State(s): State<Shared>, Json(body): Json<Value>) -> Response {
    s.export_bodies.lock().unwrap().push(body.clone());
    if s.slow_export {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }

    let options = &body["excelOptions"];
    let summary_only = options["summary"] == json!(true)
        && options["rawdata"] != json!(true)
        && options["overkill"] != json!(true)
        && options["underkill"] != json!(true);
    let content_type = if summary_only {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else {
        "application/zip"
    };

    let mut bytes = vec![0u8; EXPORT_SIZE];
    bytes[..2].copy_from_slice(b"PK");
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

async fn gerber(Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    if q.get("json_path").map(String::as_str) == Some("") {
        return Json(json!({"image": null}));
    }
    // 4バイトのPNGシグネチャ先頭
    Json(json!({"image": "iVBORw=="}))
}

async fn image(Path(path): Path<String>) -> Response {
    if path.ends_with("_Axial.png") || path.ends_with("_Pad.png") {
        ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G']).into_response()
    } else {
        (StatusCode::NOT_FOUND, "").into_response()
    }
}
