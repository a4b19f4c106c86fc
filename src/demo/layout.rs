//! Payload layout of the demo application.
//!
//! Fixed little-endian offsets so C shells can read the payload in place:
//!
//! ```text
//! 0    counter        i64
//! 8    input_len      u32
//! 12   input_text     [u8; 256]
//! 268  todo_count     u32
//! 272  next_todo_id   u32
//! 276  filter         u32
//! 280  todos          todo_count × 264 bytes
//!        +0  id        u32
//!        +4  completed u8
//!        +5  (pad)     u8
//!        +6  text_len  u16
//!        +8  text      [u8; 256]
//! ```

use crate::error::ReduceError;

pub const TEXT_CAPACITY: usize = 256;
pub const MAX_TODOS: usize = 100;

pub const OFF_COUNTER: usize = 0;
pub const OFF_INPUT_LEN: usize = 8;
pub const OFF_INPUT_TEXT: usize = 12;
pub const OFF_TODO_COUNT: usize = OFF_INPUT_TEXT + TEXT_CAPACITY;
pub const OFF_NEXT_TODO_ID: usize = OFF_TODO_COUNT + 4;
pub const OFF_FILTER: usize = OFF_NEXT_TODO_ID + 4;
pub const HEADER_SIZE: usize = OFF_FILTER + 4;

pub const TODO_STRIDE: usize = 8 + TEXT_CAPACITY;
const T_ID: usize = 0;
const T_COMPLETED: usize = 4;
const T_TEXT_LEN: usize = 6;
const T_TEXT: usize = 8;

/// Which todos a shell should list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Filter::All),
            1 => Some(Filter::Active),
            2 => Some(Filter::Completed),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Filter::All => 0,
            Filter::Active => 1,
            Filter::Completed => 2,
        }
    }

    pub fn admits(self, item: &TodoItem) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !item.completed,
            Filter::Completed => item.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: u32,
    pub completed: bool,
    pub text: String,
}

/// Decoded demo state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoState {
    pub counter: i64,
    pub input_text: String,
    pub todos: Vec<TodoItem>,
    pub next_todo_id: u32,
    pub filter: Filter,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            counter: 0,
            input_text: String::new(),
            todos: Vec::new(),
            next_todo_id: 1,
            filter: Filter::All,
        }
    }
}

impl DemoState {
    /// Decode a payload. An empty payload is the default state.
    pub fn decode(payload: &[u8]) -> Result<Self, ReduceError> {
        if payload.is_empty() {
            return Ok(Self::default());
        }
        if payload.len() < HEADER_SIZE {
            return Err(corrupt(format!("header truncated at {} bytes", payload.len())));
        }

        let todo_count = read_u32(payload, OFF_TODO_COUNT) as usize;
        if todo_count > MAX_TODOS {
            return Err(corrupt(format!("todo count {} exceeds {}", todo_count, MAX_TODOS)));
        }
        if payload.len() != HEADER_SIZE + todo_count * TODO_STRIDE {
            return Err(corrupt(format!(
                "length {} does not match {} todos",
                payload.len(),
                todo_count
            )));
        }

        let input_len = read_u32(payload, OFF_INPUT_LEN) as usize;
        let input_text = read_text(payload, OFF_INPUT_TEXT, input_len)?;
        let filter = Filter::from_raw(read_u32(payload, OFF_FILTER))
            .ok_or_else(|| corrupt("unknown filter".to_string()))?;

        let mut todos = Vec::with_capacity(todo_count);
        for i in 0..todo_count {
            let base = HEADER_SIZE + i * TODO_STRIDE;
            let text_len = read_u16(payload, base + T_TEXT_LEN) as usize;
            todos.push(TodoItem {
                id: read_u32(payload, base + T_ID),
                completed: payload[base + T_COMPLETED] != 0,
                text: read_text(payload, base + T_TEXT, text_len)?,
            });
        }

        Ok(Self {
            counter: i64::from_le_bytes(fixed(payload, OFF_COUNTER)),
            input_text,
            todos,
            next_todo_id: read_u32(payload, OFF_NEXT_TODO_ID),
            filter,
        })
    }

    /// Encode into the fixed layout. Text longer than 256 bytes is cut at a
    /// character boundary; reducers validate lengths before it gets here.
    pub fn encode(&self) -> Vec<u8> {
        let count = self.todos.len().min(MAX_TODOS);
        let mut out = vec![0u8; HEADER_SIZE + count * TODO_STRIDE];

        out[OFF_COUNTER..OFF_COUNTER + 8].copy_from_slice(&self.counter.to_le_bytes());
        let input = clip(&self.input_text);
        write_u32(&mut out, OFF_INPUT_LEN, input.len() as u32);
        out[OFF_INPUT_TEXT..OFF_INPUT_TEXT + input.len()].copy_from_slice(input);
        write_u32(&mut out, OFF_TODO_COUNT, count as u32);
        write_u32(&mut out, OFF_NEXT_TODO_ID, self.next_todo_id);
        write_u32(&mut out, OFF_FILTER, self.filter.raw());

        for (i, item) in self.todos.iter().take(count).enumerate() {
            let base = HEADER_SIZE + i * TODO_STRIDE;
            write_u32(&mut out, base + T_ID, item.id);
            out[base + T_COMPLETED] = item.completed as u8;
            let text = clip(&item.text);
            out[base + T_TEXT_LEN..base + T_TEXT_LEN + 2]
                .copy_from_slice(&(text.len() as u16).to_le_bytes());
            out[base + T_TEXT..base + T_TEXT + text.len()].copy_from_slice(text);
        }
        out
    }

    pub fn visible_todos(&self) -> impl Iterator<Item = &TodoItem> {
        self.todos.iter().filter(|item| self.filter.admits(item))
    }

    pub fn items_left(&self) -> usize {
        self.todos.iter().filter(|item| !item.completed).count()
    }
}

fn corrupt(reason: String) -> ReduceError {
    ReduceError::InvalidPayload(format!("corrupt state payload: {}", reason))
}

fn clip(text: &str) -> &[u8] {
    if text.len() <= TEXT_CAPACITY {
        return text.as_bytes();
    }
    let mut end = TEXT_CAPACITY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text.as_bytes()[..end]
}

fn fixed<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(fixed(buf, offset))
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(fixed(buf, offset))
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn read_text(buf: &[u8], offset: usize, len: usize) -> Result<String, ReduceError> {
    if len > TEXT_CAPACITY {
        return Err(corrupt(format!("text length {} exceeds {}", len, TEXT_CAPACITY)));
    }
    String::from_utf8(buf[offset..offset + len].to_vec())
        .map_err(|_| corrupt("text is not UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DemoState {
        DemoState {
            counter: -3,
            input_text: "draft".to_string(),
            todos: vec![
                TodoItem { id: 1, completed: false, text: "Buy milk".to_string() },
                TodoItem { id: 2, completed: true, text: "Call mom".to_string() },
            ],
            next_todo_id: 3,
            filter: Filter::Active,
        }
    }

    #[test]
    fn header_offsets_are_fixed() {
        assert_eq!(OFF_TODO_COUNT, 268);
        assert_eq!(OFF_FILTER, 276);
        assert_eq!(HEADER_SIZE, 280);
        assert_eq!(TODO_STRIDE, 264);
    }

    #[test]
    fn encoded_state_decodes_back() {
        let state = sample();
        let bytes = state.encode();
        assert_eq!(bytes.len(), HEADER_SIZE + 2 * TODO_STRIDE);
        assert_eq!(i64::from_le_bytes(bytes[0..8].try_into().unwrap()), -3);
        assert_eq!(DemoState::decode(&bytes).unwrap(), state);
    }

    #[test]
    fn empty_payload_is_default_state() {
        assert_eq!(DemoState::decode(&[]).unwrap(), DemoState::default());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = sample().encode();
        assert!(DemoState::decode(&bytes[..100]).is_err());
        assert!(DemoState::decode(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn long_text_is_clipped_on_char_boundary() {
        let mut state = DemoState::default();
        state.input_text = "é".repeat(200);
        let decoded = DemoState::decode(&state.encode()).unwrap();
        assert_eq!(decoded.input_text.len(), 256);
        assert!(decoded.input_text.chars().all(|c| c == 'é'));
    }

    #[test]
    fn filter_controls_visible_todos() {
        let state = sample();
        let visible: Vec<_> = state.visible_todos().map(|t| t.id).collect();
        assert_eq!(visible, vec![1]);
        assert_eq!(state.items_left(), 1);
    }
}
