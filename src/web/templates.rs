//! # Templates Maud — HTML Server-Side Rendering
//!
//! Servidor retorna **HTML fragments**, o HTMX os injeta no DOM.
//!
//! ## Layout (`full_page`)
//!
//! ```text
//! ┌──────────────── nav-bar ─────────────────────┐
//! │ 💬 Smart Chatbot                   N intents │
//! ├──────────────────────────────┬───────────────┤
//! │                              │ Threshold     │
//! │    Chat Messages             │ [====o=====]  │
//! │    (You / Bot)               │   0.60        │
//! │                              │               │
//! ├──────────────────────────────┤ [Clear chat]  │
//! │ [______________________][Send]               │
//! └──────────────────────────────┴───────────────┘
//! ```

use maud::{html, Markup, PreEscaped, DOCTYPE};
use uuid::Uuid;

use crate::config::ThresholdSettings;
use crate::core::{ChatTurn, IntentCatalog};

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";

/// Página principal do chat.
///
/// O id da sessão vai num campo hidden do formulário e nos `hx-vals`
/// do botão de reset; recarregar a página abre uma sessão nova.
pub fn full_page(
    session: Uuid,
    threshold: f32,
    bounds: &ThresholdSettings,
    catalog: &IntentCatalog,
) -> Markup {
    let session_vals = format!(r#"{{"session": "{}"}}"#, session);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Smart Chatbot" }
                link rel="stylesheet" href="/assets/style.css";
                script src=(HTMX_SRC) {}
            }
            body {
                div class="app-shell" {
                    nav class="nav-bar" {
                        span class="nav-brand" { "💬 Smart Chatbot" }
                        span class="nav-status" {
                            (format!("{} intents · {} patterns", catalog.len(), catalog.pattern_count()))
                        }
                    }

                    div class="app-container" {
                        div class="chat-panel" {
                            div id="chat-messages" class="chat-messages" {
                                div class="message system-message welcome" {
                                    div class="message-content" { "Ask me anything!" }
                                }
                            }

                            form id="chat-form" class="chat-input-area"
                                hx-post="/chat"
                                hx-target="#chat-messages"
                                hx-swap="beforeend" {
                                input type="hidden" name="session" value=(session.to_string());
                                input type="text" name="message"
                                    placeholder="Type your message here..."
                                    autocomplete="off"
                                    autofocus;
                                button type="submit" { "Send" }
                            }
                        }

                        div class="sidebar" {
                            (threshold_control(session, threshold, bounds))
                            button class="sidebar-button"
                                hx-post="/session/reset"
                                hx-vals=(session_vals)
                                hx-target="#chat-messages"
                                hx-swap="innerHTML" {
                                "🗑 Clear chat"
                            }
                        }
                    }
                }
                (PreEscaped(r#"<script>
// Auto-scroll quando novas mensagens chegam
const chat = document.getElementById('chat-messages');
new MutationObserver(() => { chat.scrollTop = chat.scrollHeight; })
    .observe(chat, { childList: true });
// Limpa o input após cada envio
document.body.addEventListener('htmx:afterRequest', (e) => {
    if (e.detail.elt.id === 'chat-form') e.detail.elt.reset();
});
</script>"#))
            }
        }
    }
}

/// Slider do threshold da sessão — substitui a si mesmo (`outerHTML`) a
/// cada ajuste. O id da sessão vai junto, então só ela é afetada.
pub fn threshold_control(session: Uuid, value: f32, bounds: &ThresholdSettings) -> Markup {
    html! {
        form id="threshold-control" class="threshold-control"
            hx-post="/settings/threshold"
            hx-trigger="change"
            hx-swap="outerHTML" {
            input type="hidden" name="session" value=(session.to_string());
            label for="threshold" { "Similarity threshold" }
            input type="range" id="threshold" name="threshold"
                min=(bounds.min.to_string())
                max=(bounds.max.to_string())
                step=(bounds.step.to_string())
                value=(format!("{:.2}", value));
            span class="threshold-value" { (format!("{:.2}", value)) }
        }
    }
}

/// Um turno (User ou Bot).
pub fn turn_message(turn: &ChatTurn) -> Markup {
    html! {
        div class=(format!("message {}", turn.speaker.css_class())) {
            div class="message-role" { (turn.speaker.label()) }
            div class="message-content" { (turn.text) }
        }
    }
}

/// Transcrição completa de uma sessão.
pub fn transcript(turns: &[ChatTurn]) -> Markup {
    html! {
        @for turn in turns {
            (turn_message(turn))
        }
    }
}

pub fn system_message(text: &str) -> Markup {
    html! {
        div class="message system-message" {
            div class="message-content" { (text) }
        }
    }
}

pub fn error_message(text: &str) -> Markup {
    html! {
        div class="message bot-message error" {
            div class="message-role" { "Bot" }
            div class="message-content" { (text) }
        }
    }
}

pub fn metrics_line(line: &str) -> Markup {
    html! {
        div class="message system-message metrics" {
            div class="message-content metrics-line" { (format!("\u{26a1} {}", line)) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Speaker;

    #[test]
    fn turn_text_is_escaped() {
        let turn = ChatTurn {
            speaker: Speaker::User,
            text: "<script>alert(1)</script>".into(),
        };
        let html = turn_message(&turn).into_string();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("user-message"));
    }

    #[test]
    fn transcript_keeps_order() {
        let turns = vec![
            ChatTurn { speaker: Speaker::User, text: "first".into() },
            ChatTurn { speaker: Speaker::Bot, text: "second".into() },
        ];
        let html = transcript(&turns).into_string();
        let a = html.find("first").unwrap();
        let b = html.find("second").unwrap();
        assert!(a < b);
    }

    #[test]
    fn slider_reflects_bounds() {
        let session = Uuid::new_v4();
        let html = threshold_control(session, 0.6, &ThresholdSettings::default()).into_string();
        assert!(html.contains(&format!(r#"value="{session}""#)));
        assert!(html.contains(r#"min="0.4""#));
        assert!(html.contains(r#"max="0.9""#));
        assert!(html.contains(r#"value="0.60""#));
    }
}
