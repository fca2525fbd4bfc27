use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use server::errors::TransportError;
use server::routes::{self, AppState};
use server::telegram::TelegramClient;
use service::access::AllowList;
use service::bot::{worker, AccessPolicy, MessageRouter};
use service::i18n::Messages;
use service::storage::NoteStore;

const TOKEN: &str = "42-test-token";

/// Fake Bot API: records every `sendMessage` body and refuses `setWebhook`.
#[derive(Clone, Default)]
struct FakeTelegram {
    sent: Arc<Mutex<Vec<Value>>>,
}

async fn send_message(State(fake): State<FakeTelegram>, Json(body): Json<Value>) -> Json<Value> {
    fake.sent.lock().await.push(body);
    Json(json!({"ok": true, "result": {"message_id": 1}}))
}

async fn set_webhook() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: bad webhook"})),
    )
}

async fn spawn(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });
    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

async fn start_fake() -> anyhow::Result<(FakeTelegram, TelegramClient)> {
    let fake = FakeTelegram::default();
    let app = Router::new()
        .route(&format!("/bot{TOKEN}/sendMessage"), post(send_message))
        .route(&format!("/bot{TOKEN}/setWebhook"), post(set_webhook))
        .with_state(fake.clone());
    let base_url = spawn(app).await?;
    let client = TelegramClient::new(&base_url, TOKEN, Duration::from_secs(5))?;
    Ok((fake, client))
}

fn messages() -> anyhow::Result<Messages> {
    let raw = json!({
        "en": {"saved": "Saved: {0} = {1}", "list_empty": "Nothing stored yet."},
        "ru": {"saved": "Сохранено: {0} = {1}"}
    });
    let tables: HashMap<String, HashMap<String, String>> = serde_json::from_value(raw)?;
    Ok(Messages::from_tables(tables)?)
}

fn update(id: i64, sender: i64, lang: &str, text: &str) -> Value {
    json!({
        "update_id": id,
        "message": {
            "message_id": id,
            "from": {"id": sender, "is_bot": false, "first_name": "T", "language_code": lang},
            "chat": {"id": sender, "type": "private"},
            "date": 0,
            "text": text
        }
    })
}

#[tokio::test]
async fn send_message_reaches_api() -> anyhow::Result<()> {
    let (fake, client) = start_fake().await?;
    client.send_message(7, "hello").await?;
    let sent = fake.sent.lock().await;
    assert_eq!(sent.as_slice(), &[json!({"chat_id": 7, "text": "hello"})]);
    Ok(())
}

#[tokio::test]
async fn api_errors_are_typed() -> anyhow::Result<()> {
    let (_fake, client) = start_fake().await?;
    match client.set_webhook("https://example.com/hook", Some("s3cret")).await {
        Err(TransportError::Api { description, code }) => {
            assert_eq!(code, 400);
            assert_eq!(description, "Bad Request: bad webhook");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn webhook_to_reply_pipeline() -> anyhow::Result<()> {
    let (fake, client) = start_fake().await?;

    let data_path = std::env::temp_dir().join(format!("e2e_store_{}.json", Uuid::new_v4()));
    let store = NoteStore::load(&data_path).await;
    let router = Arc::new(MessageRouter::new(
        Arc::clone(&store),
        Arc::new(AllowList::default()),
        Arc::new(messages()?),
        AccessPolicy { admin_id: 1, enforce_allow_list: false },
    ));
    let (tx, rx) = mpsc::channel(8);
    let worker = tokio::spawn(worker::run(rx, router, Arc::new(client)));

    let bot_url = spawn(routes::build_router(AppState { queue: tx, secret: None }, "/hook")).await?;
    let http = reqwest::Client::new();
    for body in [
        update(1, 9, "en", "/list"),
        update(2, 9, "ru-RU", "wifi: pass:word"),
        update(3, 9, "en", "/list"),
    ] {
        let res = http.post(format!("{bot_url}/hook")).json(&body).send().await?;
        assert_eq!(res.status(), reqwest::StatusCode::OK);
    }

    // wait for the worker to drain the queue
    let mut texts = Vec::new();
    for _ in 0..100 {
        texts = fake
            .sent
            .lock()
            .await
            .iter()
            .filter_map(|m| m["text"].as_str().map(str::to_string))
            .collect();
        if texts.len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(
        texts,
        vec!["Nothing stored yet.", "Сохранено: wifi = pass:word", "wifi: pass:word"]
    );
    assert_eq!(store.get("wifi").await.as_deref(), Some("pass:word"));

    worker.abort();
    let _ = tokio::fs::remove_file(&data_path).await;
    Ok(())
}
