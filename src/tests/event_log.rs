use std::time::Duration;

use crate::{
    event::*,
    event_log::{self, LogEvent, WithOffset},
};
use anyhow::Result;

#[test]
fn event_logs_sanity_check() -> Result<()> {
    let (event_writer, event_reader) = event_log::new_in_memory_shared();

    let start_offset = event_reader.get_start_offset()?;

    assert_eq!(
        event_reader.read(start_offset, 0, Some(Duration::from_secs(0)))?,
        WithOffset {
            offset: start_offset,
            data: vec![]
        }
    );

    assert_eq!(
        event_reader.read(start_offset, 1, Some(Duration::from_secs(0)))?,
        WithOffset {
            offset: start_offset,
            data: vec![]
        }
    );

    let inserted_offset = event_writer.write(&[Event::Test])?;

    assert_eq!(
        event_reader.read(inserted_offset, 1, Some(Duration::from_secs(0)))?,
        WithOffset {
            offset: inserted_offset,
            data: vec![]
        }
    );

    assert_eq!(
        event_reader.read(start_offset, 1, Some(Duration::from_secs(0)))?,
        WithOffset {
            offset: inserted_offset,
            data: vec![LogEvent {
                offset: start_offset,
                details: Event::Test
            }]
        }
    );

    Ok(())
}

#[test]
fn reads_are_limited_and_resumable() -> Result<()> {
    let (event_writer, event_reader) = event_log::new_in_memory_shared();

    let end = event_writer.write(&[
        Event::BidPlaced {
            bidder: "alice".to_owned(),
            deposit: 10,
        },
        Event::Test,
        Event::AuctionEnded {
            winner: "alice".to_owned(),
            amount: 10,
        },
    ])?;
    assert_eq!(end, 3);

    let first = event_reader.read(0, 2, None)?;
    assert_eq!(first.offset, 2);
    assert_eq!(
        first.data.iter().map(|e| e.offset).collect::<Vec<_>>(),
        vec![0, 1]
    );

    let rest = event_reader.read(first.offset, 10, None)?;
    assert_eq!(rest.offset, 3);
    assert_eq!(
        rest.data,
        vec![LogEvent {
            offset: 2,
            details: Event::AuctionEnded {
                winner: "alice".to_owned(),
                amount: 10,
            }
        }]
    );

    Ok(())
}

#[test]
fn read_past_the_end_fails() -> Result<()> {
    let (_event_writer, event_reader) = event_log::new_in_memory_shared();
    assert!(event_reader
        .read(5, 1, Some(Duration::from_millis(1)))
        .is_err());
    Ok(())
}

#[test]
fn blocked_reader_wakes_up_on_write() -> Result<()> {
    let (event_writer, event_reader) = event_log::new_in_memory_shared();

    let reader = std::thread::spawn(move || event_reader.read(0, 1, Some(Duration::from_secs(10))));
    std::thread::sleep(Duration::from_millis(50));
    event_writer.write(&[Event::Test])?;

    let read = reader
        .join()
        .map_err(|_| anyhow::format_err!("reader panicked"))??;
    assert_eq!(read.offset, 1);
    assert_eq!(read.data.len(), 1);
    Ok(())
}
