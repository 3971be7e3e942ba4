/// Reusable UI components
use crate::messages::DuplicateEntry;
use patternfly_yew::prelude::*;
use yew::prelude::*;

/// What a page is doing right now, shown above its controls
#[derive(Clone, PartialEq)]
pub enum Status {
    Idle,
    Loading(String),
    Info(String),
    Error(String),
}

impl Status {
    pub fn is_busy(&self) -> bool {
        matches!(self, Status::Loading(_))
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusBannerProps {
    pub status: Status,
}

#[function_component(StatusBanner)]
pub fn status_banner(props: &StatusBannerProps) -> Html {
    match &props.status {
        Status::Idle => html! {},
        Status::Loading(msg) => html! {
            <div class="loading-text-center">
                <Spinner />
                <p class="loading-text">{msg}</p>
            </div>
        },
        Status::Info(msg) => html! {
            <div class="message-top-margin">
                <Alert r#type={AlertType::Info} title={msg.clone()} inline={true}>
                </Alert>
            </div>
        },
        Status::Error(err) => html! {
            <div class="message-top-margin">
                <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                    {err.clone()}
                </Alert>
            </div>
        },
    }
}

#[derive(Properties, PartialEq)]
pub struct DuplicateListProps {
    pub entries: Vec<DuplicateEntry>,
}

/// Duplicates found by the last scan, one line per duplicate tab
#[function_component(DuplicateList)]
pub fn duplicate_list(props: &DuplicateListProps) -> Html {
    if props.entries.is_empty() {
        return html! {
            <p class="message-text">{"No duplicates found."}</p>
        };
    }

    html! {
        <div class="stats-container">
            <h2 class="stats-title">{format!("{} duplicate tabs", props.entries.len())}</h2>
            <ul class="stats-box">
                {for props.entries.iter().map(|entry| html! {
                    <li key={entry.duplicate_id} class="stat-item" title={entry.url.clone()}>
                        {describe(entry)}
                    </li>
                })}
            </ul>
        </div>
    }
}

fn describe(entry: &DuplicateEntry) -> String {
    if entry.title.is_empty() {
        entry.url.clone()
    } else {
        format!("{} — {}", entry.title, entry.url)
    }
}
