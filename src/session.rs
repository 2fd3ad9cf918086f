//! Feeding a board with commands: reading JSON-lines command scripts and
//! running one board behind a channel so every command is applied whole,
//! one at a time.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::mpsc::Receiver;
use tracing::{info, warn};

use crate::orderboard::{BoardCommand, OrderBoard, OrderIdSource};

/// Parses a command script: one JSON `BoardCommand` per line. Blank lines and
/// lines starting with `#` are skipped.
pub fn parse_commands(text: &str) -> Result<Vec<BoardCommand>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str::<BoardCommand>(line.trim())
                .with_context(|| format!("Invalid board command on line {}", index + 1))
        })
        .collect()
}

pub async fn read_commands(path: &Path) -> Result<Vec<BoardCommand>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read command script {}", path.display()))?;
    parse_commands(&text)
}

/// Applies every command received on `rx` to a fresh board and returns the
/// board once the channel closes. Failed commands are logged and skipped.
///
/// The board is not `Send`; run this alongside its producers on one task
/// (`tokio::join!`) or on a `LocalSet`.
pub async fn drive<I>(mut rx: Receiver<BoardCommand>, mut ids: I) -> OrderBoard
where
    I: OrderIdSource,
{
    let mut board = OrderBoard::new();
    let mut applied = 0usize;
    let mut rejected = 0usize;

    while let Some(command) = rx.recv().await {
        match board.process_command(&mut ids, command) {
            Ok(_) => applied += 1,
            Err(e) => {
                warn!("Board task: rejected command: {:#}", e);
                rejected += 1;
            }
        }
    }

    info!(
        "Board task: feed closed after {} commands ({} rejected), {} orders live",
        applied + rejected,
        rejected,
        board.len()
    );
    board
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::channel;

    use super::*;
    use crate::orderboard::{IdSequence, Side};

    const SCRIPT: &str = r#"
# scenario from the desk
{"Add":{"quantity":"3.5","price":"306","side":"SELL"}}
{"Add":{"quantity":"1.2","price":"310","side":"SELL"}}
{"Add":{"quantity":"1.5","price":"307","side":"SELL"}}
{"Add":{"quantity":2,"price":306,"side":"SELL"}}
{"Add":{"quantity":"1","price":"308","side":"BUY"}}
{"Add":{"quantity":"2","price":"310","side":"BUY"}}
{"Add":{"quantity":"3","price":"310","side":"BUY"}}
"#;

    #[test]
    fn test_parse_commands() {
        let commands = parse_commands(SCRIPT).unwrap();
        assert_eq!(commands.len(), 7);
        assert!(matches!(
            commands[4],
            BoardCommand::Add { side: Side::Buy, .. }
        ));
    }

    #[test]
    fn test_parse_commands_reports_line() {
        let err = parse_commands("{\"Cancel\":{\"order_id\":1}}\n\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[tokio::test]
    async fn test_drive_applies_commands_in_order() {
        let (tx, rx) = channel::<BoardCommand>(4);
        let feed = async move {
            for command in parse_commands(SCRIPT).unwrap() {
                tx.send(command).await.unwrap();
            }
            tx.send(BoardCommand::Cancel { order_id: 3 }).await.unwrap();
            tx.send(BoardCommand::Add {
                quantity: "junk".into(),
                price: "300".into(),
                side: Side::Buy,
            })
            .await
            .unwrap();
            tx.send(BoardCommand::Cancel { order_id: 99 }).await.unwrap();
            for _ in 0..2 {
                tx.send(BoardCommand::Add {
                    quantity: "79228162514264337593543950335".into(),
                    price: "320".into(),
                    side: Side::Sell,
                })
                .await
                .unwrap();
            }
        };

        let ((), board) = tokio::join!(feed, drive(rx, IdSequence::new()));
        assert_eq!(board.len(), 7);
        assert_eq!(
            board.display_live_board(),
            vec![
                "SELL 3.5 kg for £306",
                "SELL 1.5 kg for £307",
                "SELL 1.2 kg for £310",
                "SELL 79228162514264337593543950335 kg for £320",
                "BUY 5 kg for £310",
                "BUY 1 kg for £308",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_commands_missing_file() {
        let err = read_commands(Path::new("no/such/script.jsonl"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no/such/script.jsonl"));
    }
}
