//! Template gallery shown when starting a workflow.

use flowforge_workflow::template::{self, Difficulty, TemplateCategory, TemplateFilter, WorkflowTemplate};
use leptos::prelude::*;

#[component]
pub fn TemplatePicker(
    on_select: impl Fn(&'static WorkflowTemplate) + Clone + Send + Sync + 'static,
    on_skip: impl Fn() + Send + Sync + 'static,
) -> impl IntoView {
    let filter = RwSignal::new(TemplateFilter::default());

    view! {
        <div class="template-picker">
            <div class="picker-header">
                <h2>"Choose a Workflow Template"</h2>
                <p class="muted">{format!("{} templates to start from", template::all().len())}</p>
            </div>
            <div class="filters">
                <input
                    type="search"
                    placeholder="Search templates..."
                    prop:value=move || filter.get().query
                    on:input=move |ev| filter.update(|f| f.query = event_target_value(&ev))
                />
                <select
                    prop:value=move || filter.get().category.map_or("all", TemplateCategory::as_str)
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        filter.update(|f| f.category = TemplateCategory::from_filter(&value));
                    }
                >
                    <option value="all">"All Categories"</option>
                    {TemplateCategory::ALL.into_iter().map(|c| view! {
                        <option value=c.as_str()>{c.as_str()}</option>
                    }).collect_view()}
                </select>
                <select
                    prop:value=move || filter.get().difficulty.map_or("all", Difficulty::as_str)
                    on:change=move |ev| {
                        let value = event_target_value(&ev);
                        filter.update(|f| f.difficulty = Difficulty::from_filter(&value));
                    }
                >
                    <option value="all">"All Difficulties"</option>
                    {Difficulty::ALL.into_iter().map(|d| view! {
                        <option value=d.as_str()>{d.as_str()}</option>
                    }).collect_view()}
                </select>
            </div>

            {move || {
                let matches = filter.get().apply();
                if matches.is_empty() {
                    return view! {
                        <div class="empty">
                            <h3>"No templates found"</h3>
                            <p>"Try a different search or clear the filters."</p>
                            <button class="secondary-btn" on:click=move |_| filter.set(TemplateFilter::default())>
                                "Clear Filters"
                            </button>
                        </div>
                    }
                    .into_any();
                }
                let on_select = on_select.clone();
                view! {
                    <div class="template-grid">
                        {matches.into_iter().map(|t| {
                            let on_select = on_select.clone();
                            view! {
                                <div class="template-card">
                                    <h3>{t.name.as_str()}</h3>
                                    <p>{t.description.as_str()}</p>
                                    <div class="template-meta">
                                        <span class="badge">{t.category.as_str()}</span>
                                        <span class=format!("badge difficulty-{}", t.difficulty.as_str())>
                                            {t.difficulty.as_str()}
                                        </span>
                                        <span class="muted">{format!("{} nodes", t.nodes.len())}</span>
                                    </div>
                                    <div class="template-tags">
                                        {t.tags.iter().map(|tag| view! { <span class="tag">{tag.as_str()}</span> }).collect_view()}
                                    </div>
                                    <button class="primary-btn" on:click=move |_| on_select(t)>"Use Template"</button>
                                </div>
                            }
                        }).collect_view()}
                    </div>
                }
                .into_any()
            }}

            <div class="picker-footer">
                <button class="link-btn" on:click=move |_| on_skip()>"Start from scratch"</button>
            </div>
        </div>
    }
}
