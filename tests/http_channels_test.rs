//! Discord / Telegram 渠道对接 HTTP 接口的测试

use agent_notify::notification::channels::{DiscordChannel, DiscordConfig, TelegramChannel, TelegramConfig};
use agent_notify::{HookEvent, NotificationChannel, NotificationContext, SendResult};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn no_env(_: &str) -> Option<String> {
    None
}

fn permission_ctx() -> NotificationContext {
    let event: HookEvent = serde_json::from_value(json!({
        "hook_event_name": "Notification",
        "session_id": "s1",
        "cwd": "/home/dev/shop",
        "notification": {"type": "permission_required", "message": "Delete build/"}
    }))
    .unwrap();
    NotificationContext::new(event).with_summaries("Edited cart.rs", "Edited cart.rs")
}

fn discord_config(url: String) -> DiscordConfig {
    serde_json::from_value(json!({
        "enabled": true,
        "webhookUrl": url,
        "discordMapping": {
            "notification": {
                "permission_required": {
                    "title": "Permission needed",
                    "description": "[project-name] wants to [requested-action]",
                    "color": 15158332,
                    "priority": "high"
                }
            }
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_discord_no_content_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_partial_json(json!({
            "username": "Claude Code",
            "embeds": [{
                "title": "Permission needed",
                "description": "shop wants to Delete build/",
                "color": 15158332,
                "footer": {"text": "Claude Code • shop"}
            }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let channel = DiscordChannel::new(&discord_config(format!("{}/webhook", server.uri())), &no_env);
    let result = channel.notify(&permission_ctx()).await.unwrap();
    assert_eq!(result, SendResult::Sent);
}

#[tokio::test]
async fn test_discord_server_error_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let channel = DiscordChannel::new(&discord_config(format!("{}/webhook", server.uri())), &no_env);
    let result = channel.notify(&permission_ctx()).await.unwrap();
    assert_eq!(result, SendResult::Failed("500 - boom".to_string()));
}

fn telegram_config(base: String) -> TelegramConfig {
    serde_json::from_value(json!({
        "enabled": true,
        "botToken": "123:abc",
        "chatId": "42",
        "apiBaseUrl": base,
        "telegramMapping": {
            "notification": {
                "permission_required": {"message": "*[project-name]*: {message}", "priority": "high"}
            }
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_telegram_send_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "42",
            "text": "*shop*: Delete build/",
            "parse_mode": "Markdown"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(&telegram_config(server.uri()), &no_env);
    assert!(channel.is_enabled());
    assert_eq!(channel.notify(&permission_ctx()).await.unwrap(), SendResult::Sent);
}

#[tokio::test]
async fn test_telegram_ok_false_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": false, "description": "chat not found"})),
        )
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(&telegram_config(server.uri()), &no_env);
    let result = channel.notify(&permission_ctx()).await.unwrap();
    assert_eq!(result, SendResult::Failed("chat not found".to_string()));
}

#[tokio::test]
async fn test_telegram_http_error_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(&telegram_config(server.uri()), &no_env);
    let result = channel.notify(&permission_ctx()).await.unwrap();
    assert_eq!(result, SendResult::Failed("401 - Unauthorized".to_string()));
}

#[tokio::test]
async fn test_telegram_below_high_priority_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let config: TelegramConfig = serde_json::from_value(json!({
        "enabled": true,
        "botToken": "123:abc",
        "chatId": "42",
        "apiBaseUrl": server.uri(),
        "telegramMapping": {
            "stop": {"message": "done"},
            "notification": {
                "permission_required": {"message": "*[project-name]*: {message}", "priority": "low"}
            }
        }
    }))
    .unwrap();
    let channel = TelegramChannel::new(&config, &no_env);

    let result = channel.notify(&permission_ctx()).await.unwrap();
    assert_eq!(result, SendResult::Skipped("priority low below high".to_string()));

    let stop: HookEvent = serde_json::from_value(json!({"hook_event_name": "Stop", "cwd": "/home/dev/shop"})).unwrap();
    let result = channel.notify(&NotificationContext::new(stop)).await.unwrap();
    assert_eq!(result, SendResult::Skipped("priority not set".to_string()));
}
