//! SVG canvas for placing, dragging and connecting workflow nodes.

use flowforge_core::NodeId;
use flowforge_workflow::{GraphEditor, Position};
use leptos::prelude::*;

/// Node dimensions for layout calculations.
pub const NODE_WIDTH: f64 = 160.0;
pub const NODE_HEIGHT: f64 = 60.0;

const MIN_VIEW_WIDTH: f64 = 800.0;
const MIN_VIEW_HEIGHT: f64 = 500.0;
const VIEW_MARGIN: f64 = 40.0;

/// Bezier from the right edge of `source` to the left edge of `target`.
#[must_use]
pub fn edge_path(source: Position, target: Position) -> String {
    let x1 = source.x + NODE_WIDTH;
    let y1 = source.y + NODE_HEIGHT / 2.0;
    let x2 = target.x;
    let y2 = target.y + NODE_HEIGHT / 2.0;
    let ctrl_offset = ((x2 - x1).abs() / 2.0).max(50.0);
    format!(
        "M {} {} C {} {} {} {} {} {}",
        x1,
        y1,
        x1 + ctrl_offset,
        y1,
        x2 - ctrl_offset,
        y2,
        x2,
        y2
    )
}

/// `viewBox` large enough for every node, never smaller than the default.
#[must_use]
pub fn view_box(positions: impl IntoIterator<Item = Position>) -> String {
    let (width, height) = positions.into_iter().fold(
        (MIN_VIEW_WIDTH, MIN_VIEW_HEIGHT),
        |(w, h), p| {
            (
                w.max(p.x + NODE_WIDTH + VIEW_MARGIN),
                h.max(p.y + NODE_HEIGHT + VIEW_MARGIN),
            )
        },
    );
    format!("0 0 {width} {height}")
}

#[component]
pub fn NodeCanvas(
    editor: RwSignal<GraphEditor>,
    connecting_from: RwSignal<Option<NodeId>>,
) -> impl IntoView {
    let dragging_node = RwSignal::new(Option::<NodeId>::None);
    // Last pointer position while dragging; `None` until the first move.
    let last_mouse_pos = RwSignal::new(Option::<(f64, f64)>::None);

    let on_mouse_move = move |ev: leptos::ev::MouseEvent| {
        let Some(node_id) = dragging_node.get_untracked() else {
            return;
        };
        let current = (f64::from(ev.client_x()), f64::from(ev.client_y()));
        if let Some((last_x, last_y)) = last_mouse_pos.get_untracked() {
            let (dx, dy) = (current.0 - last_x, current.1 - last_y);
            editor.update(|e| {
                let Some(position) = e.node(&node_id).map(|n| n.position) else {
                    return;
                };
                let moved = Position::new(position.x + dx, position.y + dy);
                if let Err(err) = e.move_node(&node_id, moved) {
                    tracing::debug!(error = %err, "drag target vanished");
                }
            });
        }
        last_mouse_pos.set(Some(current));
    };

    let end_drag = move || {
        dragging_node.set(None);
        last_mouse_pos.set(None);
    };

    view! {
        <div class="node-canvas-container">
            <svg
                class="node-canvas-svg"
                viewBox=move || editor.with(|e| view_box(e.nodes().iter().map(|n| n.position)))
                on:mousemove=on_mouse_move
                on:mouseup=move |_| end_drag()
                on:mouseleave=move |_| end_drag()
            >
                <defs>
                    <pattern id="grid" width="20" height="20" patternUnits="userSpaceOnUse">
                        <path d="M 20 0 L 0 0 0 20" fill="none" stroke="#2a2a2a" stroke-width="0.5"/>
                    </pattern>
                    <marker id="arrowhead" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto">
                        <polygon points="0 0, 10 3.5, 0 7" fill="#666"/>
                    </marker>
                </defs>
                <rect width="100%" height="100%" fill="url(#grid)"/>

                // Edges first so nodes draw over them
                {move || editor.with(|e| {
                    e.edges().iter().filter_map(|edge| {
                        let source = e.node(&edge.source)?.position;
                        let target = e.node(&edge.target)?.position;
                        let path = edge_path(source, target);
                        let edge_id = edge.id.clone();
                        Some(view! {
                            <g class="edge-group">
                                <path
                                    class="edge-path"
                                    d=path.clone()
                                    fill="none"
                                    stroke="#666"
                                    stroke-width="2"
                                    marker-end="url(#arrowhead)"
                                />
                                <path
                                    class="edge-hitbox"
                                    d=path
                                    fill="none"
                                    stroke="transparent"
                                    stroke-width="10"
                                    on:click=move |_| editor.update(|e| {
                                        if let Err(err) = e.remove_edge(&edge_id) {
                                            tracing::debug!(error = %err, "edge already removed");
                                        }
                                    })
                                />
                            </g>
                        })
                    }).collect_view()
                })}

                {move || editor.with(|e| {
                    let selected = e.selected_id().cloned();
                    let is_connecting = connecting_from.get().is_some();
                    e.nodes().iter().map(|node| {
                        let node_id = node.id.clone();
                        let node_id_delete = node.id.clone();
                        let node_id_connect = node.id.clone();
                        let node_type = node.node_type().as_str();
                        let is_selected = selected.as_ref() == Some(&node.id);
                        let Position { x, y } = node.position;

                        view! {
                            <g
                                class=format!(
                                    "workflow-node node-type-{} {}",
                                    node_type,
                                    if is_selected { "selected" } else { "" },
                                )
                                transform=format!("translate({x}, {y})")
                                on:mousedown=move |ev: leptos::ev::MouseEvent| {
                                    ev.prevent_default();
                                    if let Some(from) = connecting_from.get_untracked() {
                                        let target = node_id.clone();
                                        editor.update(|e| {
                                            e.connect(from, target);
                                        });
                                        connecting_from.set(None);
                                    } else {
                                        editor.update(|e| e.select(Some(node_id.clone())));
                                        last_mouse_pos.set(Some((
                                            f64::from(ev.client_x()),
                                            f64::from(ev.client_y()),
                                        )));
                                        dragging_node.set(Some(node_id.clone()));
                                    }
                                }
                            >
                                <rect class="node-bg" width=NODE_WIDTH height=NODE_HEIGHT rx="6" ry="6"/>
                                <rect class="node-type-bar" width=NODE_WIDTH height="6" rx="6" ry="6"/>
                                <rect class="node-type-bar-bottom" y="3" width=NODE_WIDTH height="3"/>
                                <text class="node-label" x=NODE_WIDTH / 2.0 y="28" text-anchor="middle">
                                    {node.name.clone()}
                                </text>
                                <text class="node-type-text" x=NODE_WIDTH / 2.0 y="45" text-anchor="middle">
                                    {node_type}
                                </text>

                                <circle class="port input-port" cx="0" cy=NODE_HEIGHT / 2.0 r="6"/>

                                // Output port: press to start a connection
                                <circle
                                    class=format!("port output-port {}", if is_connecting { "connecting" } else { "" })
                                    cx=NODE_WIDTH
                                    cy=NODE_HEIGHT / 2.0
                                    r="6"
                                    on:mousedown=move |ev: leptos::ev::MouseEvent| {
                                        ev.stop_propagation();
                                        connecting_from.set(Some(node_id_connect.clone()));
                                    }
                                />

                                <g
                                    class="delete-btn"
                                    transform=format!("translate({}, 0)", NODE_WIDTH - 16.0)
                                    on:mousedown=move |ev: leptos::ev::MouseEvent| {
                                        ev.stop_propagation();
                                        editor.update(|e| {
                                            e.delete_node(&node_id_delete);
                                        });
                                    }
                                >
                                    <circle cx="8" cy="8" r="8" class="delete-bg"/>
                                    <text x="8" y="12" text-anchor="middle" class="delete-x">"×"</text>
                                </g>
                            </g>
                        }
                    }).collect_view()
                })}
            </svg>

            {move || editor.with(|e| e.nodes().is_empty()).then(|| view! {
                <div class="canvas-empty-state">
                    <p>"No nodes yet."</p>
                    <p>"Add nodes using the toolbar above, or start from a template."</p>
                </div>
            })}
        </div>
    }
}
