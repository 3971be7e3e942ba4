/// Options page: edit the grouping rules
use crate::chrome::send_request;
use crate::messages::Request;
use crate::rules::{GroupColor, Rule, default_rules};
use crate::ui::components::{Status, StatusBanner};
use patternfly_yew::prelude::*;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// One editable row; `keywords` holds the raw comma-separated text
#[derive(Clone, PartialEq, Debug)]
pub struct RuleDraft {
    pub key: Uuid,
    pub name: String,
    pub color: GroupColor,
    pub keywords: String,
}

impl RuleDraft {
    pub fn blank() -> RuleDraft {
        RuleDraft {
            key: Uuid::new_v4(),
            name: String::new(),
            color: GroupColor::default(),
            keywords: String::new(),
        }
    }

    pub fn from_rule(rule: &Rule) -> RuleDraft {
        RuleDraft {
            key: Uuid::new_v4(),
            name: rule.name.clone(),
            color: rule.color,
            keywords: rule.keywords_csv(),
        }
    }

    /// `None` when the row has no usable keywords
    pub fn to_rule(&self) -> Option<Rule> {
        Rule::from_form(&self.name, self.color, &self.keywords)
    }
}

fn drafts_from(rules: &[Rule]) -> Vec<RuleDraft> {
    rules.iter().map(RuleDraft::from_rule).collect()
}

/// Rules to save; rows without keywords are dropped
fn collect_rules(drafts: &[RuleDraft]) -> Vec<Rule> {
    drafts.iter().filter_map(RuleDraft::to_rule).collect()
}

#[derive(Clone, Copy)]
enum Field {
    Name,
    Keywords,
}

#[function_component(OptionsPage)]
pub fn options_page() -> Html {
    let status = use_state(|| Status::Loading("Loading rules...".to_string()));
    let drafts = use_state(Vec::<RuleDraft>::new);

    // Load rules on mount
    {
        let status = status.clone();
        let drafts = drafts.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match send_request(&Request::GetRules).await {
                    Ok(response) => {
                        drafts.set(drafts_from(&response.rules.unwrap_or_default()));
                        status.set(Status::Idle);
                    }
                    Err(e) => status.set(Status::Error(format!("Failed to load rules: {}", e))),
                }
            });
            || ()
        });
    }

    let on_text = {
        let drafts = drafts.clone();
        move |key: Uuid, field: Field| {
            let drafts = drafts.clone();
            Callback::from(move |e: InputEvent| {
                let value = e.target_unchecked_into::<HtmlInputElement>().value();
                let mut rows = (*drafts).clone();
                if let Some(row) = rows.iter_mut().find(|r| r.key == key) {
                    match field {
                        Field::Name => row.name = value,
                        Field::Keywords => row.keywords = value,
                    }
                }
                drafts.set(rows);
            })
        }
    };

    let on_color = {
        let drafts = drafts.clone();
        move |key: Uuid| {
            let drafts = drafts.clone();
            Callback::from(move |e: Event| {
                let value = e.target_unchecked_into::<HtmlSelectElement>().value();
                let Some(color) = GroupColor::parse(&value) else {
                    return;
                };
                let mut rows = (*drafts).clone();
                if let Some(row) = rows.iter_mut().find(|r| r.key == key) {
                    row.color = color;
                }
                drafts.set(rows);
            })
        }
    };

    let on_remove = {
        let drafts = drafts.clone();
        move |key: Uuid| {
            let drafts = drafts.clone();
            Callback::from(move |_: MouseEvent| {
                let rows: Vec<RuleDraft> = drafts.iter().filter(|r| r.key != key).cloned().collect();
                drafts.set(rows);
            })
        }
    };

    let on_add = {
        let drafts = drafts.clone();
        Callback::from(move |_| {
            let mut rows = (*drafts).clone();
            rows.push(RuleDraft::blank());
            drafts.set(rows);
        })
    };

    let on_reset = {
        let drafts = drafts.clone();
        let status = status.clone();
        Callback::from(move |_| {
            drafts.set(drafts_from(&default_rules()));
            status.set(Status::Info("Defaults restored. Save to keep them.".to_string()));
        })
    };

    // Save handler; the editor shows the rules as stored
    let on_save = {
        let drafts = drafts.clone();
        let status = status.clone();
        Callback::from(move |_| {
            let rules = collect_rules(&drafts);
            let drafts = drafts.clone();
            let status = status.clone();

            status.set(Status::Loading("Saving...".to_string()));

            spawn_local(async move {
                match send_request(&Request::SaveRules { rules: rules.clone() }).await {
                    Ok(_) => {
                        drafts.set(drafts_from(&rules));
                        status.set(Status::Info(format!("Saved {} rules.", rules.len())));
                    }
                    Err(e) => status.set(Status::Error(format!("Save failed: {}", e))),
                }
            });
        })
    };

    let is_busy = status.is_busy();

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Tab Tamer Rules"}</h1>
            <p class="message-text">
                {"Tabs whose hostname contains one of a rule's keywords join that rule's group. The first matching rule wins."}
            </p>

            <StatusBanner status={(*status).clone()} />

            <table class="rules-table">
                <thead>
                    <tr>
                        <th>{"Group name"}</th>
                        <th>{"Color"}</th>
                        <th>{"Keywords (comma separated)"}</th>
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    {for drafts.iter().map(|row| html! {
                        <tr key={row.key.to_string()}>
                            <td>
                                <input
                                    type="text"
                                    value={row.name.clone()}
                                    placeholder="Group"
                                    oninput={on_text(row.key, Field::Name)}
                                />
                            </td>
                            <td>
                                <select onchange={on_color(row.key)}>
                                    {for GroupColor::ALL.iter().map(|color| html! {
                                        <option value={color.as_str()} selected={*color == row.color}>
                                            {color.as_str()}
                                        </option>
                                    })}
                                </select>
                            </td>
                            <td>
                                <input
                                    type="text"
                                    value={row.keywords.clone()}
                                    placeholder="github, gitlab"
                                    oninput={on_text(row.key, Field::Keywords)}
                                />
                            </td>
                            <td>
                                <Button onclick={on_remove(row.key)} variant={ButtonVariant::Danger} size={ButtonSize::Small}>
                                    {"Remove"}
                                </Button>
                            </td>
                        </tr>
                    })}
                </tbody>
            </table>

            <div class="flex-column-gap">
                <Button onclick={on_add} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Add Rule"}
                </Button>
                <Button onclick={on_save} disabled={is_busy} variant={ButtonVariant::Primary}>
                    {"Save"}
                </Button>
                <Button onclick={on_reset} disabled={is_busy} variant={ButtonVariant::Secondary}>
                    {"Reset to Defaults"}
                </Button>
            </div>
        </div>
    }
}
