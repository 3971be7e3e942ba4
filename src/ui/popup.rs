/// Popup UI for Tab Tamer extension
use crate::chrome::{ChromeStorage, open_options_page, send_request};
use crate::duplicates::KeepPolicy;
use crate::messages::{DuplicateEntry, Request};
use crate::storage::load_auto_group;
use crate::ui::components::{DuplicateList, Status, StatusBanner};
use log::warn;
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    let status = use_state(|| Status::Idle);
    let collapse = use_state(|| false);
    let auto_group = use_state(|| false);
    let keep = use_state(KeepPolicy::default);
    let duplicates = use_state(|| None::<Vec<DuplicateEntry>>);

    // Read the auto-group flag on mount
    {
        let auto_group = auto_group.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match load_auto_group(&ChromeStorage).await {
                    Ok(enabled) => auto_group.set(enabled),
                    Err(e) => warn!("Could not read auto-group flag: {}", e),
                }
            });
            || ()
        });
    }

    let on_collapse_change = {
        let collapse = collapse.clone();
        Callback::from(move |e: Event| {
            collapse.set(e.target_unchecked_into::<HtmlInputElement>().checked());
        })
    };

    // Group tabs handler; the popup closes itself on success
    let on_group = {
        let status = status.clone();
        let collapse = collapse.clone();

        Callback::from(move |_| {
            let status = status.clone();
            let request = Request::GroupTabs { collapse: *collapse };

            status.set(Status::Loading("Grouping tabs...".to_string()));

            spawn_local(async move {
                match send_request(&request).await {
                    Ok(_) => {
                        status.set(Status::Idle);
                        if let Some(window) = web_sys::window() {
                            let _ = window.close();
                        }
                    }
                    Err(e) => status.set(Status::Error(format!("Grouping failed: {}", e))),
                }
            });
        })
    };

    let on_auto_group_change = {
        let status = status.clone();
        let auto_group = auto_group.clone();

        Callback::from(move |e: Event| {
            let enabled = e.target_unchecked_into::<HtmlInputElement>().checked();
            let status = status.clone();
            let auto_group = auto_group.clone();
            auto_group.set(enabled);

            spawn_local(async move {
                if let Err(e) = send_request(&Request::SetAutoGroup { enabled }).await {
                    auto_group.set(!enabled);
                    status.set(Status::Error(format!("Could not save setting: {}", e)));
                }
            });
        })
    };

    // Scan for duplicates handler
    let on_scan = {
        let status = status.clone();
        let duplicates = duplicates.clone();

        Callback::from(move |_| {
            let status = status.clone();
            let duplicates = duplicates.clone();

            status.set(Status::Loading("Scanning for duplicates...".to_string()));

            spawn_local(async move {
                match send_request(&Request::FindDuplicates).await {
                    Ok(response) => {
                        duplicates.set(Some(response.duplicates.unwrap_or_default()));
                        status.set(Status::Idle);
                    }
                    Err(e) => status.set(Status::Error(format!("Scan failed: {}", e))),
                }
            });
        })
    };

    let on_keep_change = {
        let keep = keep.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            keep.set(parse_keep(&value));
        })
    };

    // Close duplicates handler
    let on_close = {
        let status = status.clone();
        let duplicates = duplicates.clone();
        let keep = keep.clone();

        Callback::from(move |_| {
            let status = status.clone();
            let duplicates = duplicates.clone();
            let request = Request::CloseDuplicates { keep: *keep };

            status.set(Status::Loading("Closing duplicates...".to_string()));

            spawn_local(async move {
                match send_request(&request).await {
                    Ok(response) => {
                        duplicates.set(None);
                        status.set(Status::Info(closed_message(response.closed.unwrap_or(0))));
                    }
                    Err(e) => status.set(Status::Error(format!("Close failed: {}", e))),
                }
            });
        })
    };

    let on_options = {
        let status = status.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            let status = status.clone();
            spawn_local(async move {
                if let Err(e) = open_options_page().await {
                    status.set(Status::Error(e));
                }
            });
        })
    };

    let is_busy = status.is_busy();

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Tamer"}</h1>

            <StatusBanner status={(*status).clone()} />

            <div class="flex-column-gap">
                <Button onclick={on_group} disabled={is_busy} variant={ButtonVariant::Primary} block={true}>
                    {"Group Tabs Now"}
                </Button>
                <label>
                    <input type="checkbox" checked={*collapse} onchange={on_collapse_change} />
                    {" Collapse groups after grouping"}
                </label>
                <label>
                    <input type="checkbox" checked={*auto_group} onchange={on_auto_group_change} />
                    {" Auto-group new tabs"}
                </label>
            </div>

            <div class="flex-column-gap tab-pane-content">
                <Button onclick={on_scan} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Scan for Duplicates"}
                </Button>

                if let Some(entries) = (*duplicates).clone() {
                    <DuplicateList entries={entries} />
                }

                <label>
                    {"Keep: "}
                    <select onchange={on_keep_change}>
                        <option value="oldest" selected={*keep == KeepPolicy::Oldest}>{"Oldest tab"}</option>
                        <option value="newest" selected={*keep == KeepPolicy::Newest}>{"Newest tab"}</option>
                    </select>
                </label>
                <Button onclick={on_close} disabled={is_busy} variant={ButtonVariant::Danger} block={true}>
                    {"Close Duplicates"}
                </Button>
            </div>

            <p class="footer-popup">
                <a href="#" onclick={on_options}>{"Edit grouping rules"}</a>
            </p>
        </div>
    }
}

fn parse_keep(value: &str) -> KeepPolicy {
    match value {
        "newest" => KeepPolicy::Newest,
        _ => KeepPolicy::Oldest,
    }
}

fn closed_message(count: usize) -> String {
    match count {
        0 => "No duplicate tabs to close.".to_string(),
        1 => "Closed 1 duplicate tab.".to_string(),
        n => format!("Closed {} duplicate tabs.", n),
    }
}
