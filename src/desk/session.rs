//! Conversation state machine for the front desk.
//!
//! Every incoming message is an [`Input`]; the desk matches it against the
//! session's current [`State`] and answers with a [`Reply`] plus the next state.

use super::store::{Balance, SalonStore, StoreError, UserId, UserRecord};
use crate::config::ScanConfig;
use crate::error::{ConfigError, ScanError};
use crate::scanner::Scanner;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};

/// Direction of a balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Add prepaid minutes
    Credit,
    /// Spend minutes
    Debit,
}

/// Where a conversation currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State {
    /// No flow in progress
    #[default]
    Idle,
    /// Registration: waiting for the full name
    AwaitingFullName,
    /// Registration: waiting for the birth date
    AwaitingBirthDate {
        /// Name given in the previous step
        full_name: String,
    },
    /// Registration: waiting for the phone number
    AwaitingPhone {
        /// Name given earlier
        full_name: String,
        /// Birth date given earlier
        birth_date: NaiveDate,
    },
    /// Staff flow: waiting for a marker photo or a typed customer id
    AwaitingCustomer {
        /// Pending balance change
        op: Op,
    },
    /// Staff flow: waiting for the number of minutes
    AwaitingMinutes {
        /// Pending balance change
        op: Op,
        /// Customer identified in the previous step
        customer: UserId,
    },
    /// Staff flow: waiting for the broadcast text
    AwaitingBroadcast,
}

/// Menu commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    /// Start registration
    Register,
    /// Show own profile and balance
    Profile,
    /// Staff: add minutes to a customer
    CreditMinutes,
    /// Staff: spend a customer's minutes
    DebitMinutes,
    /// Staff: message every registered user
    Broadcast,
}

impl Cmd {
    fn staff_only(self) -> bool {
        matches!(self, Cmd::CreditMinutes | Cmd::DebitMinutes | Cmd::Broadcast)
    }
}

/// One incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Free text
    Text(String),
    /// Encoded photo bytes
    Photo(Vec<u8>),
    /// Return to the main menu
    Back,
    /// Menu command
    Command(Cmd),
}

/// Answer to one message
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Ask for the full name
    AskFullName,
    /// Ask for the birth date (`DD.MM.YYYY`)
    AskBirthDate,
    /// Ask for the phone number
    AskPhone,
    /// Full name needs at least two words
    InvalidFullName,
    /// Birth date did not parse as `DD.MM.YYYY`
    InvalidBirthDate,
    /// Phone is not `+7` followed by ten digits
    InvalidPhone,
    /// Registration finished
    Registered,
    /// The user already has an account
    AlreadyRegistered,
    /// The user must register first
    NotRegistered,
    /// Own profile
    Profile {
        /// Stored registration data
        record: UserRecord,
        /// Current minutes
        balance: Balance,
    },
    /// Ask staff for a marker photo or a customer id
    AskCustomer,
    /// The photo did not yield a token; send another one
    Retry(ScanError),
    /// The id is not a registered customer
    UnknownCustomer,
    /// Ask for the number of minutes
    AskMinutes {
        /// Identified customer
        customer: UserId,
    },
    /// Minutes must be a positive integer
    ExpectedNumber,
    /// Debit larger than the remaining balance
    InsufficientMinutes {
        /// Minutes left
        available: u32,
        /// Minutes asked for
        requested: u32,
    },
    /// Minutes added
    Credited {
        /// Customer
        customer: UserId,
        /// Balance after the change
        balance: Balance,
    },
    /// Minutes spent
    Debited {
        /// Customer
        customer: UserId,
        /// Balance after the change
        balance: Balance,
    },
    /// Ask for the broadcast text
    AskBroadcast,
    /// Broadcast queued
    BroadcastSent {
        /// Number of users reached
        recipients: usize,
    },
    /// Flow abandoned, back at the main menu
    Cancelled,
    /// Staff-only command from a customer
    Forbidden,
    /// The store rejected the change for a reason the flow does not handle
    StoreFailed(StoreError),
    /// Input does not fit the current state
    Unrecognized,
}

/// Per-user conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Messenger id of the person talking to the desk
    pub user_id: UserId,
    /// Messenger handle, stored on registration
    pub username: Option<String>,
    /// Staff members may change balances and broadcast
    pub is_admin: bool,
    /// Current state
    pub state: State,
}

impl Session {
    /// Fresh idle session
    pub fn new(user_id: UserId, username: Option<String>, is_admin: bool) -> Self {
        Self {
            user_id,
            username,
            is_admin,
            state: State::Idle,
        }
    }
}

/// Front desk: conversation logic over a store and a marker scanner
pub struct Desk<S: SalonStore> {
    store: S,
    scanner: Scanner,
}

impl<S: SalonStore> Desk<S> {
    /// Build a desk, validating the scanner configuration
    pub fn new(store: S, config: ScanConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            scanner: Scanner::new(config)?,
        })
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Underlying store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Process one message and advance the session
    pub fn handle(&mut self, session: &mut Session, input: Input) -> Reply {
        let state = std::mem::take(&mut session.state);
        let (next, reply) = self.transition(session, state, input);
        debug!("session {}: {:?} -> {:?}", session.user_id, next, reply);
        session.state = next;
        reply
    }

    fn transition(&mut self, session: &Session, state: State, input: Input) -> (State, Reply) {
        match (state, input) {
            (_, Input::Back) => (State::Idle, Reply::Cancelled),

            (state, Input::Command(cmd)) if cmd.staff_only() && !session.is_admin => {
                (state, Reply::Forbidden)
            }
            (_, Input::Command(Cmd::Register)) => {
                if self.store.user_exists(session.user_id) {
                    (State::Idle, Reply::AlreadyRegistered)
                } else {
                    (State::AwaitingFullName, Reply::AskFullName)
                }
            }
            (_, Input::Command(Cmd::Profile)) => (State::Idle, self.profile(session.user_id)),
            (_, Input::Command(Cmd::CreditMinutes)) => {
                (State::AwaitingCustomer { op: Op::Credit }, Reply::AskCustomer)
            }
            (_, Input::Command(Cmd::DebitMinutes)) => {
                (State::AwaitingCustomer { op: Op::Debit }, Reply::AskCustomer)
            }
            (_, Input::Command(Cmd::Broadcast)) => (State::AwaitingBroadcast, Reply::AskBroadcast),

            (State::AwaitingFullName, Input::Text(text)) => match valid_full_name(&text) {
                Some(full_name) => (State::AwaitingBirthDate { full_name }, Reply::AskBirthDate),
                None => (State::AwaitingFullName, Reply::InvalidFullName),
            },
            (State::AwaitingBirthDate { full_name }, Input::Text(text)) => {
                match parse_birth_date(&text) {
                    Some(birth_date) => (
                        State::AwaitingPhone {
                            full_name,
                            birth_date,
                        },
                        Reply::AskPhone,
                    ),
                    None => (State::AwaitingBirthDate { full_name }, Reply::InvalidBirthDate),
                }
            }
            (
                State::AwaitingPhone {
                    full_name,
                    birth_date,
                },
                Input::Text(text),
            ) => match normalize_phone(&text) {
                Some(phone) => {
                    let record = UserRecord {
                        id: session.user_id,
                        username: session.username.clone(),
                        full_name,
                        birth_date,
                        phone,
                        registered_at: Local::now().naive_local(),
                    };
                    match self.store.create_user(record) {
                        Ok(()) => (State::Idle, Reply::Registered),
                        Err(StoreError::AlreadyRegistered(_)) => {
                            (State::Idle, Reply::AlreadyRegistered)
                        }
                        Err(err) => {
                            warn!("registration of {} failed: {err}", session.user_id);
                            (State::Idle, Reply::StoreFailed(err))
                        }
                    }
                }
                None => (
                    State::AwaitingPhone {
                        full_name,
                        birth_date,
                    },
                    Reply::InvalidPhone,
                ),
            },

            (State::AwaitingCustomer { op }, Input::Photo(bytes)) => {
                match self.scanner.scan_bytes(&bytes) {
                    Ok(token) => self.select_customer(op, token.as_str()),
                    Err(err) => {
                        info!("marker scan failed for operator {}: {err}", session.user_id);
                        (State::AwaitingCustomer { op }, Reply::Retry(err))
                    }
                }
            }
            (State::AwaitingCustomer { op }, Input::Text(text)) => self.select_customer(op, &text),

            (State::AwaitingMinutes { op, customer }, Input::Text(text)) => {
                match parse_minutes(&text) {
                    Some(minutes) => self.apply_minutes(op, customer, minutes),
                    None => (State::AwaitingMinutes { op, customer }, Reply::ExpectedNumber),
                }
            }

            (State::AwaitingBroadcast, Input::Text(text)) => {
                let recipients = self.store.broadcast(&text);
                (State::Idle, Reply::BroadcastSent { recipients })
            }

            (state, _) => (state, Reply::Unrecognized),
        }
    }

    fn profile(&self, id: UserId) -> Reply {
        match (self.store.user(id), self.store.balance(id)) {
            (Some(record), Ok(balance)) => Reply::Profile { record, balance },
            _ => Reply::NotRegistered,
        }
    }

    fn select_customer(&self, op: Op, text: &str) -> (State, Reply) {
        match text.trim().parse::<UserId>() {
            Ok(customer) if self.store.user_exists(customer) => (
                State::AwaitingMinutes { op, customer },
                Reply::AskMinutes { customer },
            ),
            _ => (State::AwaitingCustomer { op }, Reply::UnknownCustomer),
        }
    }

    fn apply_minutes(&mut self, op: Op, customer: UserId, minutes: u32) -> (State, Reply) {
        let delta = match op {
            Op::Credit => i64::from(minutes),
            Op::Debit => -i64::from(minutes),
        };
        match (op, self.store.adjust_balance(customer, delta)) {
            (Op::Credit, Ok(balance)) => (State::Idle, Reply::Credited { customer, balance }),
            (Op::Debit, Ok(balance)) => (State::Idle, Reply::Debited { customer, balance }),
            (_, Err(StoreError::InsufficientMinutes { available, requested })) => (
                State::AwaitingMinutes { op, customer },
                Reply::InsufficientMinutes {
                    available,
                    requested,
                },
            ),
            (_, Err(StoreError::UnknownUser(_))) => {
                (State::AwaitingCustomer { op }, Reply::UnknownCustomer)
            }
            (_, Err(err)) => {
                warn!("balance change for {customer} failed: {err}");
                (State::Idle, Reply::StoreFailed(err))
            }
        }
    }
}

/// Trimmed full name with at least two words
pub fn valid_full_name(text: &str) -> Option<String> {
    let text = text.trim();
    (text.split_whitespace().count() >= 2).then(|| text.to_string())
}

/// Parse a `DD.MM.YYYY` date
pub fn parse_birth_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d.%m.%Y").ok()
}

/// Keep digits and `+`; valid when the result is `+7` followed by ten digits
pub fn normalize_phone(text: &str) -> Option<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    (cleaned.len() == 12 && cleaned.starts_with("+7") && !cleaned[1..].contains('+'))
        .then_some(cleaned)
}

/// Positive whole number of minutes
pub fn parse_minutes(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|&m| m > 0)
}
