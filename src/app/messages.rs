use crossterm::event::KeyEvent;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    Resize(u16, u16),
}
