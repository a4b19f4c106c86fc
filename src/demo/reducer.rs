//! Transitions of the demo application.

use crate::demo::layout::{DemoState, Filter, TodoItem, MAX_TODOS, TEXT_CAPACITY};
use crate::demo::{events, fields};
use crate::error::ReduceError;
use crate::event::{Event, EventType};
use crate::reducer::{Reducer, Reduction};
use crate::runtime::{FieldSet, StateDraft};

/// Reducer for the counter, text input, navigation and todo list.
///
/// Pure: decodes the current payload, applies the event, encodes the result.
pub struct DemoReducer;

impl Reducer for DemoReducer {
    fn reduce(
        &self,
        current: &StateDraft,
        event: &Event,
        touched: &mut FieldSet,
    ) -> Result<Reduction, ReduceError> {
        let mut draft = current.clone();
        let mut app = DemoState::decode(&current.payload)?;

        let handled = match event.event_type {
            EventType::CounterIncrement => {
                app.counter = app
                    .counter
                    .checked_add(1)
                    .ok_or_else(|| ReduceError::Failed("counter overflow".to_string()))?;
                touched.insert(fields::COUNTER);
                true
            }
            EventType::CounterDecrement => {
                app.counter = app
                    .counter
                    .checked_sub(1)
                    .ok_or_else(|| ReduceError::Failed("counter underflow".to_string()))?;
                touched.insert(fields::COUNTER);
                true
            }
            EventType::CounterReset => {
                app.counter = 0;
                touched.insert(fields::COUNTER);
                true
            }
            EventType::TextInput => {
                app.input_text = text_payload(&event.payload)?.to_string();
                touched.insert(fields::INPUT_TEXT);
                true
            }
            EventType::TextCommit => {
                let text = app.input_text.trim().to_string();
                if text.is_empty() {
                    false
                } else {
                    add_todo(&mut app, text)?;
                    app.input_text.clear();
                    touched.insert(fields::TODOS);
                    touched.insert(fields::INPUT_TEXT);
                    true
                }
            }
            EventType::Navigate => {
                draft.screen = u32_payload(&event.payload)?;
                touched.insert(fields::SCREEN);
                true
            }
            EventType::NavigateBack => {
                if draft.screen == 0 {
                    false
                } else {
                    draft.screen = 0;
                    touched.insert(fields::SCREEN);
                    true
                }
            }
            EventType::Custom(code) => reduce_todo(&mut app, code, &event.payload, touched)?,
            _ => false,
        };

        if !handled {
            return Ok(Reduction::Unhandled);
        }

        draft.payload = app.encode();
        Ok(Reduction::Next(draft))
    }
}

fn reduce_todo(
    app: &mut DemoState,
    code: u32,
    payload: &[u8],
    touched: &mut FieldSet,
) -> Result<bool, ReduceError> {
    match code {
        events::TODO_ADD => {
            let text = text_payload(payload)?.trim().to_string();
            if text.is_empty() {
                return Err(ReduceError::InvalidPayload("todo text is empty".to_string()));
            }
            add_todo(app, text)?;
        }
        events::TODO_TOGGLE => {
            let id = u32_payload(payload)?;
            let Some(item) = app.todos.iter_mut().find(|t| t.id == id) else {
                return Ok(false);
            };
            item.completed = !item.completed;
        }
        events::TODO_REMOVE => {
            let id = u32_payload(payload)?;
            let before = app.todos.len();
            app.todos.retain(|t| t.id != id);
            if app.todos.len() == before {
                return Ok(false);
            }
        }
        events::TODO_TOGGLE_ALL => {
            if app.todos.is_empty() {
                return Ok(false);
            }
            let all_completed = app.todos.iter().all(|t| t.completed);
            for item in &mut app.todos {
                item.completed = !all_completed;
            }
        }
        events::TODO_CLEAR_COMPLETED => {
            let before = app.todos.len();
            app.todos.retain(|t| !t.completed);
            if app.todos.len() == before {
                return Ok(false);
            }
        }
        events::TODO_SET_FILTER => {
            let raw = u32_payload(payload)?;
            app.filter = Filter::from_raw(raw)
                .ok_or_else(|| ReduceError::InvalidPayload(format!("unknown filter {}", raw)))?;
            touched.insert(fields::FILTER);
            return Ok(true);
        }
        _ => return Ok(false),
    }
    touched.insert(fields::TODOS);
    Ok(true)
}

fn add_todo(app: &mut DemoState, text: String) -> Result<(), ReduceError> {
    if app.todos.len() >= MAX_TODOS {
        return Err(ReduceError::Failed(format!("todo list is full ({} items)", MAX_TODOS)));
    }
    let id = app.next_todo_id;
    app.next_todo_id = id.wrapping_add(1).max(1);
    app.todos.push(TodoItem {
        id,
        completed: false,
        text,
    });
    Ok(())
}

fn text_payload(payload: &[u8]) -> Result<&str, ReduceError> {
    if payload.len() > TEXT_CAPACITY {
        return Err(ReduceError::InvalidPayload(format!(
            "text of {} bytes exceeds {}",
            payload.len(),
            TEXT_CAPACITY
        )));
    }
    std::str::from_utf8(payload)
        .map_err(|_| ReduceError::InvalidPayload("text is not valid UTF-8".to_string()))
}

fn u32_payload(payload: &[u8]) -> Result<u32, ReduceError> {
    let bytes: [u8; 4] = payload.try_into().map_err(|_| {
        ReduceError::InvalidPayload(format!("expected 4-byte id, got {} bytes", payload.len()))
    })?;
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::initial_state;

    fn run(state: &StateDraft, code: u32, payload: &[u8]) -> (Result<Reduction, ReduceError>, FieldSet) {
        let mut touched = FieldSet::new();
        let result = DemoReducer.reduce(state, &Event::new(code, payload), &mut touched);
        (result, touched)
    }

    fn next(state: &StateDraft, code: u32, payload: &[u8]) -> StateDraft {
        match run(state, code, payload).0 {
            Ok(Reduction::Next(next)) => next,
            other => panic!("expected Next, got {:?}", other),
        }
    }

    fn app(state: &StateDraft) -> DemoState {
        DemoState::decode(&state.payload).unwrap()
    }

    #[test]
    fn counter_events_touch_counter() {
        let s = next(&initial_state(), 0x1000, &[]);
        let s = next(&s, 0x1000, &[]);
        let s = next(&s, 0x1001, &[]);
        assert_eq!(app(&s).counter, 1);
        let (_, touched) = run(&s, 0x1002, &[]);
        assert!(touched.contains(fields::COUNTER));
        assert_eq!(app(&next(&s, 0x1002, &[])).counter, 0);
    }

    #[test]
    fn todo_add_appends_with_fresh_ids() {
        let s = next(&initial_state(), events::TODO_ADD, b"Buy milk");
        let s = next(&s, events::TODO_ADD, b"  Call mom ");
        let state = app(&s);
        assert_eq!(state.todos.len(), 2);
        assert_eq!(state.todos[0].id, 1);
        assert_eq!(state.todos[1].text, "Call mom");
        assert_eq!(state.next_todo_id, 3);
    }

    #[test]
    fn empty_or_invalid_text_is_rejected() {
        let (r, _) = run(&initial_state(), events::TODO_ADD, b"   ");
        assert!(matches!(r, Err(ReduceError::InvalidPayload(_))));
        let (r, _) = run(&initial_state(), events::TODO_ADD, &[0xff, 0xfe]);
        assert!(matches!(r, Err(ReduceError::InvalidPayload(_))));
    }

    #[test]
    fn toggle_and_remove_use_ids() {
        let s = next(&initial_state(), events::TODO_ADD, b"a");
        let s = next(&s, events::TODO_TOGGLE, &1u32.to_le_bytes());
        assert!(app(&s).todos[0].completed);
        let s = next(&s, events::TODO_REMOVE, &1u32.to_le_bytes());
        assert!(app(&s).todos.is_empty());
    }

    #[test]
    fn missing_id_is_unhandled() {
        let (r, _) = run(&initial_state(), events::TODO_TOGGLE, &42u32.to_le_bytes());
        assert_eq!(r, Ok(Reduction::Unhandled));
        let (r, _) = run(&initial_state(), events::TODO_REMOVE, &[1, 2]);
        assert!(matches!(r, Err(ReduceError::InvalidPayload(_))));
    }

    #[test]
    fn toggle_all_then_clear_completed() {
        let s = next(&initial_state(), events::TODO_ADD, b"a");
        let s = next(&s, events::TODO_ADD, b"b");
        let s = next(&s, events::TODO_TOGGLE_ALL, &[]);
        assert!(app(&s).todos.iter().all(|t| t.completed));
        let s = next(&s, events::TODO_CLEAR_COMPLETED, &[]);
        assert!(app(&s).todos.is_empty());
        let (r, _) = run(&s, events::TODO_CLEAR_COMPLETED, &[]);
        assert_eq!(r, Ok(Reduction::Unhandled));
    }

    #[test]
    fn text_commit_moves_input_into_list() {
        let s = next(&initial_state(), 0x0101, b"Walk dog");
        let (_, touched) = run(&s, 0x0102, &[]);
        assert!(touched.contains(fields::TODOS));
        assert!(touched.contains(fields::INPUT_TEXT));
        let state = app(&next(&s, 0x0102, &[]));
        assert!(state.input_text.is_empty());
        assert_eq!(state.todos[0].text, "Walk dog");
    }

    #[test]
    fn navigation_sets_screen() {
        let s = next(&initial_state(), 0x0200, &3u32.to_le_bytes());
        assert_eq!(s.screen, 3);
        let s = next(&s, 0x0201, &[]);
        assert_eq!(s.screen, 0);
        let (r, _) = run(&s, 0x0201, &[]);
        assert_eq!(r, Ok(Reduction::Unhandled));
    }

    #[test]
    fn filter_rejects_unknown_values() {
        let s = next(&initial_state(), events::TODO_SET_FILTER, &2u32.to_le_bytes());
        assert_eq!(app(&s).filter, Filter::Completed);
        let (r, _) = run(&s, events::TODO_SET_FILTER, &9u32.to_le_bytes());
        assert!(matches!(r, Err(ReduceError::InvalidPayload(_))));
    }

    #[test]
    fn full_list_fails() {
        let mut state = DemoState::default();
        for i in 0..MAX_TODOS as u32 {
            state.todos.push(TodoItem { id: i + 1, completed: false, text: "x".into() });
        }
        let full = StateDraft::with_payload(state.encode());
        let (r, _) = run(&full, events::TODO_ADD, b"one more");
        assert!(matches!(r, Err(ReduceError::Failed(_))));
    }
}
