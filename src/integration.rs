use tracing::debug;

use crate::parser::Parser;
use crate::session::Session;
use crate::storage::DocumentStore;
use crate::tokenizer::tokenize;

/// Runs one command line and renders the result or the error as text.
pub fn process_query<S: DocumentStore>(session: &mut Session<S>, line: &str) -> String {
    // Offsets into `line` let the parser recover raw INSERT payloads.
    let result = tokenize(line)
        .and_then(|tokens| Parser::new(line, tokens).parse())
        .and_then(|command| session.execute(command));

    match result {
        Ok(outcome) => outcome.to_string(),
        Err(e) => {
            debug!(command = line.trim(), error = %e, "command rejected");
            e.to_string()
        }
    }
}
