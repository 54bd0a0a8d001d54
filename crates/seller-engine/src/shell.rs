use serde_json::{Value, json};

use crate::{
    console::{NoticeId, SellerConsole},
    error::{Result, SellerError},
    lead::{LeadId, LeadStatus},
    lead_query::{LeadBrowser, SortDirection},
    opportunity::{OpportunityId, Stage},
    remote_write::PendingWrite,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    State,
    Leads {
        search: Option<String>,
        /// `Some(None)` clears the status filter.
        status: Option<Option<LeadStatus>>,
        sort: Option<SortDirection>,
        page: Option<usize>,
    },
    Show { id: LeadId },
    Select { id: LeadId },
    Email { email: String },
    Status { status: LeadStatus },
    Amount { amount: f64 },
    Save,
    Convert,
    Cancel,
    Opportunities,
    Stage { id: OpportunityId, stage: Stage },
    Notices,
    Ack { id: NoticeId },
    Wait,
}

#[derive(Debug, Clone)]
pub struct ShellRunResult {
    pub state_changed: bool,
    pub output: Value,
}

impl ShellCommand {
    pub fn preview(&self) -> String {
        match self {
            Self::Help => "show shell command help".to_string(),
            Self::State => "show console state".to_string(),
            Self::Leads { .. } => "list leads matching the current filters".to_string(),
            Self::Show { id } => format!("show lead {id}"),
            Self::Select { id } => format!("open lead {id} for editing"),
            Self::Email { email } => format!("set edited email to '{email}'"),
            Self::Status { status } => format!("set edited status to {status}"),
            Self::Amount { amount } => format!("set conversion amount to {amount}"),
            Self::Save => "save the edited lead".to_string(),
            Self::Convert => "convert the edited lead into an opportunity".to_string(),
            Self::Cancel => "close the edit panel".to_string(),
            Self::Opportunities => "list opportunities".to_string(),
            Self::Stage { id, stage } => format!("move opportunity {id} to stage {stage}"),
            Self::Notices => "list unacknowledged notices".to_string(),
            Self::Ack { id } => format!("acknowledge notice {id}"),
            Self::Wait => "wait for pending writes to settle".to_string(),
        }
    }

    pub fn is_state_mutating(&self) -> bool {
        matches!(
            self,
            Self::Select { .. }
                | Self::Email { .. }
                | Self::Status { .. }
                | Self::Amount { .. }
                | Self::Save
                | Self::Convert
                | Self::Cancel
                | Self::Stage { .. }
                | Self::Ack { .. }
                | Self::Wait
        )
    }
}

pub fn shell_help_text() -> &'static str {
    "Seller Console shell commands:\n\
help\n\
state\n\
leads [--search TEXT] [--status New|Contacted|Lost|all] [--asc|--desc] [--page N]\n\
show LEAD_ID\n\
select LEAD_ID\n\
email ADDRESS\n\
status New|Contacted|Lost\n\
amount NUMBER\n\
save\n\
convert\n\
cancel\n\
opportunities\n\
stage OPPORTUNITY_ID New|Contacted|'In Progress'|Won|Lost\n\
notices\n\
ack NOTICE_ID\n\
wait"
}

fn token_error(command: &str) -> String {
    format!("Invalid '{command}' usage. Try: help")
}

fn parse_id(raw: &str, what: &str) -> std::result::Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|_| format!("Invalid {what} '{raw}', expected a non-negative integer"))
}

fn single_arg<'a>(tokens: &'a [String], cmd: &str) -> std::result::Result<&'a str, String> {
    if tokens.len() == 2 {
        Ok(tokens[1].as_str())
    } else {
        Err(token_error(cmd))
    }
}

fn no_args(tokens: &[String], cmd: &str, command: ShellCommand) -> std::result::Result<ShellCommand, String> {
    if tokens.len() == 1 {
        Ok(command)
    } else {
        Err(token_error(cmd))
    }
}

fn parse_leads_args(tokens: &[String]) -> std::result::Result<ShellCommand, String> {
    let mut search = None;
    let mut status = None;
    let mut sort = None;
    let mut page = None;
    let mut idx = 1usize;
    while idx < tokens.len() {
        let flag = tokens[idx].as_str();
        match flag {
            "--asc" => {
                sort = Some(SortDirection::Ascending);
                idx += 1;
            }
            "--desc" => {
                sort = Some(SortDirection::Descending);
                idx += 1;
            }
            "--search" | "--status" | "--page" => {
                let value = tokens
                    .get(idx + 1)
                    .ok_or_else(|| format!("Missing value after {flag}"))?;
                match flag {
                    "--search" => search = Some(value.clone()),
                    "--status" => {
                        status = Some(if value.eq_ignore_ascii_case("all") {
                            None
                        } else {
                            Some(value.parse::<LeadStatus>()?)
                        });
                    }
                    _ => {
                        let parsed = value
                            .parse::<usize>()
                            .map_err(|_| format!("Invalid page '{value}'"))?;
                        page = Some(parsed);
                    }
                }
                idx += 2;
            }
            other => return Err(format!("Unknown argument '{other}' for leads")),
        }
    }
    Ok(ShellCommand::Leads {
        search,
        status,
        sort,
        page,
    })
}

pub fn parse_shell_tokens(tokens: &[String]) -> std::result::Result<ShellCommand, String> {
    if tokens.is_empty() {
        return Err("Missing shell command".to_string());
    }
    let cmd = tokens[0].as_str();
    match cmd {
        "help" | "-h" | "--help" => Ok(ShellCommand::Help),
        "state" => no_args(tokens, cmd, ShellCommand::State),
        "leads" => parse_leads_args(tokens),
        "show" => Ok(ShellCommand::Show {
            id: parse_id(single_arg(tokens, cmd)?, "lead id")?,
        }),
        "select" => Ok(ShellCommand::Select {
            id: parse_id(single_arg(tokens, cmd)?, "lead id")?,
        }),
        "email" => Ok(ShellCommand::Email {
            email: single_arg(tokens, cmd)?.to_string(),
        }),
        "status" => Ok(ShellCommand::Status {
            status: single_arg(tokens, cmd)?.parse()?,
        }),
        "amount" => {
            let raw = single_arg(tokens, cmd)?;
            let amount = raw
                .parse::<f64>()
                .map_err(|_| format!("Invalid amount '{raw}'"))?;
            Ok(ShellCommand::Amount { amount })
        }
        "save" => no_args(tokens, cmd, ShellCommand::Save),
        "convert" => no_args(tokens, cmd, ShellCommand::Convert),
        "cancel" => no_args(tokens, cmd, ShellCommand::Cancel),
        "opportunities" | "opps" => no_args(tokens, cmd, ShellCommand::Opportunities),
        "stage" => {
            if tokens.len() < 3 {
                return Err(token_error(cmd));
            }
            Ok(ShellCommand::Stage {
                id: parse_id(&tokens[1], "opportunity id")?,
                stage: tokens[2..].join(" ").parse()?,
            })
        }
        "notices" => no_args(tokens, cmd, ShellCommand::Notices),
        "ack" => Ok(ShellCommand::Ack {
            id: parse_id(single_arg(tokens, cmd)?, "notice id")?,
        }),
        "wait" => no_args(tokens, cmd, ShellCommand::Wait),
        other => Err(format!("Unknown shell command '{other}'. Try: help")),
    }
}

pub fn parse_shell_line(line: &str) -> std::result::Result<ShellCommand, String> {
    let tokens = split_shell_words(line)?;
    parse_shell_tokens(&tokens)
}

/// Splits a shell line into words. Quotes group words (`stage 3 "In Progress"`),
/// a quoted empty string stays a word so `leads --search ""` clears the search,
/// and an unquoted `#` at a word boundary starts a comment.
pub fn split_shell_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some('\''), c) => word.get_or_insert_with(String::new).push(c),
            (_, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or("Dangling escape at end of shell command")?;
                word.get_or_insert_with(String::new).push(escaped);
            }
            (Some(_), c) => word.get_or_insert_with(String::new).push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                word.get_or_insert_with(String::new);
            }
            (None, '#') if word.is_none() => break,
            (None, c) if c.is_whitespace() => words.extend(word.take()),
            (None, c) => word.get_or_insert_with(String::new).push(c),
        }
    }

    if let Some(open) = quote {
        return Err(format!("Unterminated {open} quote in shell command"));
    }
    words.extend(word);
    if words.is_empty() {
        return Err("Empty shell command".to_string());
    }
    Ok(words)
}

/// Console plus the shell-side view state: the lead browser and writes
/// started from this shell that have not been waited on yet.
pub struct ShellSession {
    console: SellerConsole,
    browser: LeadBrowser,
    pending: Vec<PendingWrite>,
}

impl ShellSession {
    pub fn new(console: SellerConsole, browser: LeadBrowser) -> Self {
        Self {
            console,
            browser,
            pending: Vec::new(),
        }
    }

    pub fn console(&self) -> &SellerConsole {
        &self.console
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn track(&mut self, pending: PendingWrite) -> Value {
        let write_id = pending.id();
        self.pending.push(pending);
        json!({ "write_id": write_id, "pending": true })
    }

    pub async fn wait_all(&mut self) -> Value {
        let mut settled = Vec::new();
        for pending in self.pending.drain(..) {
            let write_id = pending.id();
            let outcome = pending.settled().await;
            settled.push(json!({ "write_id": write_id, "outcome": outcome }));
        }
        json!({ "settled": settled })
    }

    pub async fn execute(&mut self, command: &ShellCommand) -> Result<ShellRunResult> {
        let state_changed = command.is_state_mutating();
        let output = match command {
            ShellCommand::Help => json!({ "help": shell_help_text() }),
            ShellCommand::State => serde_json::to_value(self.console.snapshot())?,
            ShellCommand::Leads {
                search,
                status,
                sort,
                page,
            } => {
                if let Some(search) = search {
                    self.browser.set_search(search);
                }
                if let Some(status) = status {
                    self.browser.set_status(*status);
                }
                if let Some(sort) = sort {
                    if *sort != self.browser.query().sort {
                        self.browser.toggle_sort();
                    }
                }
                if let Some(page) = page {
                    self.browser.go_to(*page);
                }
                let leads = self.console.leads();
                let page = self.browser.view(&leads);
                json!({
                    "query": self.browser.query(),
                    "page": page,
                    "load_error": self.console.load_error(),
                })
            }
            ShellCommand::Show { id } => {
                let lead = self.console.lead(*id).ok_or(SellerError::LeadNotFound(*id))?;
                json!({ "lead": lead, "locked": self.console.is_lead_locked(*id) })
            }
            ShellCommand::Select { id } => {
                let session = self.console.select_lead(*id)?;
                json!({ "session": session })
            }
            ShellCommand::Email { email } => {
                self.console.set_email(email)?;
                json!({ "session": self.console.edit_session() })
            }
            ShellCommand::Status { status } => {
                self.console.set_status(*status)?;
                json!({ "session": self.console.edit_session() })
            }
            ShellCommand::Amount { amount } => {
                self.console.set_amount(*amount)?;
                json!({ "session": self.console.edit_session() })
            }
            ShellCommand::Save => {
                let pending = self.console.save()?;
                self.track(pending)
            }
            ShellCommand::Convert => {
                let pending = self.console.convert()?;
                self.track(pending)
            }
            ShellCommand::Cancel => {
                self.console.cancel();
                json!({ "message": "Edit panel closed" })
            }
            ShellCommand::Opportunities => json!({ "opportunities": self.console.opportunities() }),
            ShellCommand::Stage { id, stage } => {
                self.console.update_stage(*id, *stage)?;
                json!({ "opportunity": self.console.opportunity(*id) })
            }
            ShellCommand::Notices => json!({ "notices": self.console.notices() }),
            ShellCommand::Ack { id } => {
                self.console.acknowledge_notice(*id)?;
                json!({ "message": format!("Notice {id} acknowledged") })
            }
            ShellCommand::Wait => self.wait_all().await,
        };
        Ok(ShellRunResult {
            state_changed,
            output,
        })
    }
}
