//! Notification message builders

use serde_json::json;

use super::LineMessage;

/// Flex bubble sent to family members when a grandparent raises an emergency
pub fn emergency_alert(grandparent_name: &str) -> Vec<LineMessage> {
    let contents = json!({
        "type": "bubble",
        "size": "mega",
        "header": {
            "type": "box",
            "layout": "vertical",
            "backgroundColor": "#DC143C",
            "paddingAll": "20px",
            "contents": [{
                "type": "box",
                "layout": "horizontal",
                "contents": [
                    { "type": "text", "text": "🚨", "size": "xl", "flex": 0 },
                    { "type": "text", "text": "緊急通知", "weight": "bold", "color": "#ffffff", "size": "xl", "margin": "md" }
                ]
            }]
        },
        "body": {
            "type": "box",
            "layout": "vertical",
            "paddingAll": "20px",
            "contents": [
                { "type": "text", "text": format!("{grandparent_name}さんから"), "size": "sm", "color": "#999999" },
                { "type": "text", "text": "緊急の連絡があります", "size": "xl", "weight": "bold", "margin": "md", "wrap": true },
                { "type": "separator", "margin": "xl" },
                { "type": "text", "text": "すぐに確認して、連絡を取ってください。", "margin": "xl", "wrap": true, "color": "#333333" }
            ]
        },
        "footer": {
            "type": "box",
            "layout": "vertical",
            "paddingAll": "10px",
            "contents": [
                { "type": "text", "text": "⚠️ この通知は緊急性が高い内容です", "size": "xs", "color": "#FF6347", "align": "center" }
            ]
        }
    });

    vec![LineMessage::Flex {
        alt_text: format!("【緊急通知】{grandparent_name}さんから緊急の連絡があります"),
        contents,
    }]
}

/// New quiz announcement with a link to the answer page
pub fn new_quiz(question_text: &str, quiz_url: &str) -> Vec<LineMessage> {
    vec![LineMessage::Text {
        text: format!("新しいクイズが届きました！\n\n{question_text}\n\n回答はこちら: {quiz_url}"),
    }]
}

/// Family-facing alert: no quiz for `days` days
pub fn no_quiz_alert(days: f64) -> Vec<LineMessage> {
    vec![LineMessage::Text {
        text: format!(
            "最後のクイズから{}日が経過しています。おじいちゃん・おばあちゃんに連絡してみませんか？",
            days.floor() as i64
        ),
    }]
}

/// Grandparent-facing reminder to post a quiz
pub fn quiz_reminder(create_url: &str) -> Vec<LineMessage> {
    vec![LineMessage::Text {
        text: format!(
            "そろそろ新しいクイズを出してみませんか？家族がクイズを待っています。\n\n作成はこちら: {create_url}"
        ),
    }]
}

/// "Other" request forwarded to grandparents
pub fn other_request(requester_name: &str, content: &str) -> Vec<LineMessage> {
    vec![LineMessage::Text {
        text: format!("{requester_name}さんからリクエストが届きました。\n\n{content}"),
    }]
}

/// Tells the requester that their quiz theme was answered with a new quiz
pub fn request_fulfilled(request_content: &str, quiz_url: &str) -> Vec<LineMessage> {
    vec![LineMessage::Text {
        text: format!(
            "あなたのリクエスト「{request_content}」のクイズが出題されました！\n\n回答はこちら: {quiz_url}"
        ),
    }]
}
