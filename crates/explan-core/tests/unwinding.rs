//! Failure propagation through the block combinator: one annotation line per
//! enclosing level, innermost first, and the original error reaches the
//! outermost caller unchanged.

use std::any::type_name;
use std::fmt;

use anyhow::anyhow;
use explan_core::{objects, Logger, StringBuffer, StringHandler, RESULT};

fn logger_with_view() -> (Logger, StringBuffer) {
    let handler = StringHandler::new();
    let view = handler.buffer();
    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(handler);
    (logger, view)
}

#[test]
fn failing_body_is_annotated_and_reraised() {
    let (mut logger, view) = logger_with_view();
    let result: Result<i32, anyhow::Error> = logger.block(
        objects!["Going to solve the universe"],
        |logger| {
            logger.explain(objects!["Thanks for all the fish"])?;
            Err(anyhow!("Oops"))
        },
        objects!["The answer is ", RESULT],
    );
    let error = result.unwrap_err();
    assert_eq!(error.to_string(), "Oops");
    assert_eq!(
        view.contents(),
        format!(
            "* Going to solve the universe\n\
             ** Thanks for all the fish\n\
             * Throwable thrown: {}: Oops\n",
            type_name::<anyhow::Error>()
        )
    );
}

#[test]
fn nested_failures_annotate_every_level_innermost_first() {
    let (mut logger, view) = logger_with_view();
    let result: Result<i32, anyhow::Error> = logger.block(
        objects!["Going to solve the universe"],
        |logger| {
            let inner: Result<i32, anyhow::Error> = logger.block(
                objects!["Going to solve the planet first"],
                |logger| {
                    logger.explain(objects!["Thanks for all the fish"])?;
                    Err(anyhow!("Oops"))
                },
                objects!["The answer is ", RESULT],
            );
            match inner {
                Err(error) => {
                    assert_eq!(error.to_string(), "Oops");
                    Err(anyhow!("Double oops!"))
                }
                Ok(_) => Ok(0),
            }
        },
        objects!["The answer is ", RESULT],
    );
    let error = result.unwrap_err();
    assert_eq!(error.to_string(), "Double oops!");
    let throwable = type_name::<anyhow::Error>();
    assert_eq!(
        view.contents(),
        format!(
            "* Going to solve the universe\n\
             ** Going to solve the planet first\n\
             *** Thanks for all the fish\n\
             ** Throwable thrown: {throwable}: Oops\n\
             * Throwable thrown: {throwable}: Double oops!\n"
        )
    );
}

#[derive(Debug, PartialEq, Eq)]
enum EngineError {
    Overheated,
    Logging(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overheated => f.write_str("engine overheated"),
            Self::Logging(message) => write!(f, "logging failed: {message}"),
        }
    }
}

impl From<explan_core::Error> for EngineError {
    fn from(error: explan_core::Error) -> Self {
        Self::Logging(error.to_string())
    }
}

#[test]
fn custom_error_values_survive_the_unwind_intact() {
    let (mut logger, view) = logger_with_view();
    let result: Result<u32, EngineError> = logger.block(
        objects!["spinning up"],
        |_| Err(EngineError::Overheated),
        objects!["reached ", RESULT, " rpm"],
    );
    assert_eq!(result.unwrap_err(), EngineError::Overheated);
    assert_eq!(
        view.contents(),
        format!(
            "* spinning up\n\
             * Throwable thrown: {}: engine overheated\n",
            type_name::<EngineError>()
        )
    );
}

#[test]
fn failed_block_leaves_depth_consistent_for_siblings() {
    let (mut logger, view) = logger_with_view();
    let _failed: Result<i32, anyhow::Error> =
        logger.block(objects!["doomed"], |_| Err(anyhow!("no")), objects![RESULT]);
    // Depth bookkeeping survived the failed block: a sibling renders at top level.
    logger.explain(objects!["still at top level"]).unwrap();
    assert_eq!(logger.nesting_depth(), 0);
    let contents = view.contents();
    assert!(contents.ends_with("* still at top level\n"), "got: {contents}");
}
