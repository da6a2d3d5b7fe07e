//! Side panel editing the selected node's name and typed configuration.

use flowforge_core::NodeId;
use flowforge_workflow::{GraphEditor, HttpMethod, LogLevel, NodeConfig};
use leptos::prelude::*;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Parses the headers editor: a JSON object of string values, or blank.
fn parse_headers(text: &str) -> Result<BTreeMap<String, String>, String> {
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(text).map_err(|e| format!("Headers must be a JSON object of strings: {e}"))
}

/// Parses the request body editor. Blank means no body.
fn parse_body(text: &str) -> Result<Option<JsonValue>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| format!("Body must be valid JSON: {e}"))
}

fn pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Applies `edit` to the configuration of `node_id`, if it still exists.
fn edit_config(editor: RwSignal<GraphEditor>, node_id: &NodeId, edit: impl FnOnce(&mut NodeConfig)) {
    editor.update(|e| {
        let Some(mut config) = e.node(node_id).map(|n| n.config.clone()) else {
            return;
        };
        edit(&mut config);
        if let Err(err) = e.update_node_config(node_id, config) {
            tracing::debug!(error = %err, "config edit on missing node");
        }
    });
}

#[component]
pub fn NodeConfigPanel(editor: RwSignal<GraphEditor>) -> impl IntoView {
    let (field_error, set_field_error) = signal(Option::<String>::None);

    view! {
        <div class="node-config-panel">
            {move || {
                let Some(node) = editor.with(|e| e.selected().cloned()) else {
                    return view! {
                        <p class="help">"Select a node to configure it."</p>
                    }
                    .into_any();
                };
                let node_id = node.id.clone();
                let rename_id = node.id.clone();

                view! {
                    <div class="config-content">
                        <div class="config-header">
                            <h3>"Node Configuration"</h3>
                            <button
                                class="close-config"
                                on:click=move |_| editor.update(|e| e.select(None))
                            >"×"</button>
                        </div>
                        <p class="muted mono">{format!("{} · {}", node.node_type(), node_id)}</p>

                        <div class="form-group">
                            <label>"Name"</label>
                            <input
                                type="text"
                                value=node.name.clone()
                                on:change=move |ev| {
                                    let name = event_target_value(&ev);
                                    editor.update(|e| {
                                        if let Err(err) = e.rename_node(&rename_id, name) {
                                            tracing::debug!(error = %err, "rename on missing node");
                                        }
                                    });
                                }
                            />
                        </div>

                        {move || field_error.get().map(|message| view! {
                            <p class="error-text">{message}</p>
                        })}

                        {type_fields(editor, node_id, node.config, set_field_error)}
                    </div>
                }
                .into_any()
            }}
        </div>
    }
}

fn type_fields(
    editor: RwSignal<GraphEditor>,
    node_id: NodeId,
    config: NodeConfig,
    set_field_error: WriteSignal<Option<String>>,
) -> AnyView {
    match config {
        NodeConfig::Start(_) | NodeConfig::End(_) => view! {
            <p class="help">"Start and end nodes have no settings."</p>
        }
        .into_any(),
        NodeConfig::Http(http) => {
            let (method_id, url_id, headers_id, body_id, timeout_id) = (
                node_id.clone(),
                node_id.clone(),
                node_id.clone(),
                node_id.clone(),
                node_id,
            );
            let body_text = http.body.as_ref().map(pretty).unwrap_or_default();
            view! {
                <div class="type-config">
                    <div class="form-group">
                        <label>"Method"</label>
                        <select on:change=move |ev| {
                            let Ok(method) = event_target_value(&ev).parse::<HttpMethod>() else {
                                return;
                            };
                            edit_config(editor, &method_id, |c| {
                                if let NodeConfig::Http(http) = c {
                                    http.method = method;
                                }
                            });
                        }>
                            {HttpMethod::ALL.into_iter().map(|m| view! {
                                <option value=m.as_str() selected={m == http.method}>{m.as_str()}</option>
                            }).collect_view()}
                        </select>
                    </div>
                    <div class="form-group">
                        <label>"URL"</label>
                        <input
                            type="url"
                            placeholder="https://api.example.com/data"
                            value=http.url.clone()
                            on:change=move |ev| {
                                let url = event_target_value(&ev);
                                edit_config(editor, &url_id, |c| {
                                    if let NodeConfig::Http(http) = c {
                                        http.url = url;
                                    }
                                });
                            }
                        />
                    </div>
                    <div class="form-group">
                        <label>"Headers (JSON)"</label>
                        <textarea
                            rows="4"
                            placeholder="{\"Authorization\": \"Bearer ...\"}"
                            prop:value=pretty(&http.headers)
                            on:change=move |ev| match parse_headers(&event_target_value(&ev)) {
                                Ok(headers) => {
                                    set_field_error.set(None);
                                    edit_config(editor, &headers_id, |c| {
                                        if let NodeConfig::Http(http) = c {
                                            http.headers = headers;
                                        }
                                    });
                                }
                                Err(message) => set_field_error.set(Some(message)),
                            }
                        ></textarea>
                    </div>
                    <div class="form-group">
                        <label>"Body (JSON)"</label>
                        <textarea
                            rows="5"
                            prop:value=body_text
                            on:change=move |ev| match parse_body(&event_target_value(&ev)) {
                                Ok(body) => {
                                    set_field_error.set(None);
                                    edit_config(editor, &body_id, |c| {
                                        if let NodeConfig::Http(http) = c {
                                            http.body = body;
                                        }
                                    });
                                }
                                Err(message) => set_field_error.set(Some(message)),
                            }
                        ></textarea>
                    </div>
                    <div class="form-group">
                        <label>"Timeout (ms)"</label>
                        <input
                            type="number"
                            min="0"
                            value=http.timeout.to_string()
                            on:change=move |ev| {
                                let Ok(timeout) = event_target_value(&ev).trim().parse::<u64>() else {
                                    set_field_error.set(Some("Timeout must be a whole number of milliseconds".to_string()));
                                    return;
                                };
                                set_field_error.set(None);
                                edit_config(editor, &timeout_id, |c| {
                                    if let NodeConfig::Http(http) = c {
                                        http.timeout = timeout;
                                    }
                                });
                            }
                        />
                    </div>
                </div>
            }
            .into_any()
        }
        NodeConfig::Echo(echo) => {
            let level_id = node_id.clone();
            view! {
                <div class="type-config">
                    <div class="form-group">
                        <label>"Message"</label>
                        <textarea
                            rows="3"
                            prop:value=echo.message.clone()
                            on:change=move |ev| {
                                let message = event_target_value(&ev);
                                edit_config(editor, &node_id, |c| {
                                    if let NodeConfig::Echo(echo) = c {
                                        echo.message = message;
                                    }
                                });
                            }
                        ></textarea>
                    </div>
                    <div class="form-group">
                        <label>"Level"</label>
                        <select on:change=move |ev| {
                            let Ok(level) = event_target_value(&ev).parse::<LogLevel>() else {
                                return;
                            };
                            edit_config(editor, &level_id, |c| {
                                if let NodeConfig::Echo(echo) = c {
                                    echo.level = level;
                                }
                            });
                        }>
                            {LogLevel::ALL.into_iter().map(|l| view! {
                                <option value=l.as_str() selected={l == echo.level}>{l.as_str()}</option>
                            }).collect_view()}
                        </select>
                    </div>
                </div>
            }
            .into_any()
        }
        NodeConfig::Custom(custom) => view! {
            <div class="type-config">
                <div class="form-group">
                    <label>"Code"</label>
                    <textarea
                        class="mono"
                        rows="10"
                        prop:value=custom.code.clone()
                        on:change=move |ev| {
                            let code = event_target_value(&ev);
                            edit_config(editor, &node_id, |c| {
                                if let NodeConfig::Custom(custom) = c {
                                    custom.code = code;
                                }
                            });
                        }
                    ></textarea>
                </div>
                <p class="help">"Runs on the backend with the task input in scope."</p>
            </div>
        }
        .into_any(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_headers_and_body_are_empty() {
        assert!(parse_headers("  ").expect("headers").is_empty());
        assert_eq!(parse_body("\n").expect("body"), None);
    }

    #[test]
    fn headers_parse_from_json_object() {
        let headers = parse_headers(r#"{"Accept": "application/json"}"#).expect("headers");
        assert_eq!(headers.get("Accept").map(String::as_str), Some("application/json"));
        assert!(parse_headers(r#"{"Retries": 3}"#).is_err());
        assert!(parse_headers("Accept: text/plain").is_err());
    }

    #[test]
    fn body_keeps_any_json() {
        assert_eq!(parse_body("[1, 2]").expect("body"), Some(json!([1, 2])));
        assert!(parse_body("{oops").is_err());
    }
}
