//! Command table and built-in commands
//!
//! Commands are registered once at startup into an immutable table mapping
//! the wire name to a handler and a help description. Dispatch validates
//! nothing beyond existence; each handler checks its own argument shape, and
//! a shape violation is fatal to the invoking connection only.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::{ChatError, Result};
use crate::protocol::{Invocation, Reply};
use crate::server::session::Session;
use crate::server::state::ServerState;

/// Everything a handler can reach: the shared registries, the invoking
/// session, and the command table itself (for `help`).
pub struct Context {
    pub state: Arc<ServerState>,
    pub session: Arc<Session>,
    pub commands: Arc<CommandTable>,
}

type HandlerFuture = BoxFuture<'static, Result<()>>;
type Handler = Box<dyn Fn(Context, Invocation) -> HandlerFuture + Send + Sync>;

/// One registered command.
pub struct CommandEntry {
    /// Wire name
    pub name: &'static str,
    /// One-line help text
    pub description: &'static str,
    handler: Handler,
}

/// The process-wide command registry, immutable after construction.
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    index: HashMap<&'static str, usize>,
}

impl CommandTable {
    /// Build the table of built-in commands. Registration order is the
    /// order `help` lists them in.
    pub fn builtin() -> Self {
        let mut table = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };

        table.register("name", "Set your display name.", handler(set_name));
        table.register(
            "message",
            "Send a message to everyone connected.",
            handler(send_message),
        );
        table.register("who", "Show who is connected.", no_arguments(handler(who)));
        table.register(
            "disconnect",
            "Disconnect from the server.",
            no_arguments(handler(disconnect)),
        );
        table.register(
            "help",
            "Show this listing, or what a single command does.",
            handler(help),
        );

        table
    }

    fn register(&mut self, name: &'static str, description: &'static str, handler: Handler) {
        self.index.insert(name, self.entries.len());
        self.entries.push(CommandEntry {
            name,
            description,
            handler,
        });
    }

    /// Look up a command by wire name.
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// All commands, in registration order.
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Route one decoded invocation.
    ///
    /// An unknown command gets a local reply and the session stays open. A
    /// handler error propagates to the caller, which ends the session.
    pub async fn dispatch(
        self: Arc<Self>,
        state: &Arc<ServerState>,
        session: &Arc<Session>,
        invocation: Invocation,
    ) -> Result<()> {
        let context = Context {
            state: Arc::clone(state),
            session: Arc::clone(session),
            commands: Arc::clone(&self),
        };

        match self.get(&invocation.command) {
            None => reply(
                &context,
                &format!("Unsupported command: {}.", invocation.command),
            ),
            Some(entry) => (entry.handler)(context, invocation).await,
        }
    }
}

/// Send server-attributed text to the invoking session only.
fn reply(context: &Context, text: &str) -> Result<()> {
    context
        .session
        .send(Reply::message(context.state.default_name(), text))
}

/// Box an async handler function into a table entry.
fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context, Invocation) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move |context, invocation| Box::pin(f(context, invocation)))
}

/// Wrap a handler so any supplied argument is refused before it runs.
fn no_arguments(inner: Handler) -> Handler {
    Box::new(move |context, invocation| {
        if invocation.args.is_empty() && invocation.kwargs.is_empty() {
            inner(context, invocation)
        } else {
            Box::pin(async move { reply(&context, "This command takes no arguments.") })
        }
    })
}

fn expect_arity(invocation: &Invocation, arity: usize) -> Result<()> {
    if invocation.args.len() != arity || !invocation.kwargs.is_empty() {
        return Err(ChatError::invalid_arguments(format!(
            "{} takes {} positional argument(s), got {} and {} keyword(s)",
            invocation.command,
            arity,
            invocation.args.len(),
            invocation.kwargs.len()
        )));
    }
    Ok(())
}

fn text_argument(invocation: &Invocation, position: usize) -> Result<String> {
    match invocation.args.get(position) {
        Some(Value::String(text)) => Ok(text.clone()),
        other => Err(ChatError::invalid_arguments(format!(
            "{} argument {} must be a string, got {:?}",
            invocation.command, position, other
        ))),
    }
}

/// `name(newName)`: claim or change the display name.
async fn set_name(context: Context, invocation: Invocation) -> Result<()> {
    expect_arity(&invocation, 1)?;
    let new_name = text_argument(&invocation, 0)?;

    if new_name.is_empty() {
        return reply(&context, "You must give a name.");
    }

    let current = context.session.name().await;
    if current.as_deref() == Some(new_name.as_str()) {
        return reply(&context, "Name unchanged.");
    }

    // Check, release and claim run as one critical section in the registry.
    if !context
        .state
        .claim_name(current.as_deref(), &new_name)
        .await
    {
        return reply(&context, "You cannot use that name.");
    }
    context.session.set_name(&new_name).await;

    let notice = match current {
        Some(old) => format!("{} is now known as {}.", old, new_name),
        None => format!("{} has joined the server.", new_name),
    };
    context
        .state
        .broadcast(context.state.default_name(), &notice)
        .await;
    Ok(())
}

/// `message(text)`: broadcast text attributed to the sender's name.
async fn send_message(context: Context, invocation: Invocation) -> Result<()> {
    expect_arity(&invocation, 1)?;
    let text = text_argument(&invocation, 0)?;

    let Some(sender) = context.session.name().await else {
        return reply(&context, "You must set your name before you can transmit.");
    };
    if text.is_empty() {
        return reply(&context, "Messages cannot be blank.");
    }

    context.state.broadcast(&sender, &text).await;
    Ok(())
}

/// `who()`: list every named connection, in connection order.
async fn who(context: Context, _invocation: Invocation) -> Result<()> {
    let mut lines = vec!["Who listing:".to_string()];
    for session in context.state.sessions().await {
        if let Some(name) = session.name().await {
            lines.push(format!(
                "{} from {}:{}",
                name,
                session.addr().ip(),
                session.addr().port()
            ));
        }
    }
    reply(&context, &lines.join("\n"))
}

/// `disconnect()`: say goodbye, then close the transport.
async fn disconnect(context: Context, _invocation: Invocation) -> Result<()> {
    reply(&context, "Goodbye.")?;
    context.session.close();
    Ok(())
}

/// `help(command?)`: describe one command, or list them all.
async fn help(context: Context, invocation: Invocation) -> Result<()> {
    if invocation.args.len() > 1 || !invocation.kwargs.is_empty() {
        return Err(ChatError::invalid_arguments(format!(
            "help takes at most one positional argument, got {} and {} keyword(s)",
            invocation.args.len(),
            invocation.kwargs.len()
        )));
    }

    let topic = match invocation.args.first() {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(other) => {
            return Err(ChatError::invalid_arguments(format!(
                "help argument must be a string, got {}",
                other
            )))
        }
    };

    match topic {
        None => {
            let listing = context
                .commands
                .entries()
                .iter()
                .map(|entry| format!("{}: {}", entry.name, entry.description))
                .collect::<Vec<_>>()
                .join("\n");
            reply(&context, &listing)
        }
        Some(name) => match context.commands.get(&name) {
            Some(entry) => reply(&context, entry.description),
            None => reply(&context, "No such command."),
        },
    }
}
