//! Thread-scoped registry: pass-through operations, re-entrant blocks, and
//! the one-shot file-backed block.

use std::any::type_name;

use anyhow::anyhow;
use explan_core::{config, objects, thread, Logger, StringHandler, RESULT};

#[test]
fn pass_through_blocks_compose_and_unwind() {
    let handler = StringHandler::new();
    let view = handler.buffer();
    let mut logger = Logger::new();
    logger.set_active(true);
    logger.add_handler(handler);
    let _ = thread::set_thread_logger(logger);

    let result: Result<i32, anyhow::Error> = thread::block(
        objects!["Going to solve the universe"],
        || {
            let inner: Result<i32, anyhow::Error> = thread::block(
                objects!["Going to solve the planet first"],
                || {
                    thread::explain(objects!["Thanks for all the fish"])?;
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
    assert_eq!(result.unwrap_err().to_string(), "Double oops!");

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

    assert!(thread::take_thread_logger().is_some());
}

#[test]
fn block_to_file_captures_the_unwind_and_restores_the_slot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("explanation.txt");
    config::set_active_by_default(true);

    let result: Result<i32, anyhow::Error> = thread::block_to_file(
        &path,
        objects!["Going to solve the universe"],
        || {
            let inner: Result<i32, anyhow::Error> = thread::block(
                objects!["Going to solve the planet first"],
                || {
                    thread::explain(objects!["Thanks for all the fish"])?;
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
    assert_eq!(result.unwrap_err().to_string(), "Double oops!");

    let throwable = type_name::<anyhow::Error>();
    let actual = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        actual,
        format!(
            "* Going to solve the universe\n\
             ** Going to solve the planet first\n\
             *** Thanks for all the fish\n\
             ** Throwable thrown: {throwable}: Oops\n\
             * Throwable thrown: {throwable}: Double oops!\n"
        )
    );

    // The temporary file-backed logger was uninstalled on exit.
    assert!(thread::take_thread_logger().is_none());
}

#[test]
fn block_to_file_happy_path_appends_block_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("answer.txt");
    config::set_active_by_default(true);

    let result: Result<i32, explan_core::Error> = thread::block_to_file(
        &path,
        objects!["Going to solve the universe"],
        || Ok(42),
        objects!["The answer is ", RESULT],
    );
    assert_eq!(result.unwrap(), 42);

    let actual = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = actual.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "* Going to solve the universe");
    // The file handler renders block durations by default.
    assert!(lines[1].starts_with("* The answer is 42 ("), "got: {}", lines[1]);
    assert!(lines[1].ends_with(" ms)"), "got: {}", lines[1]);
}
