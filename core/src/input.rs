#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    C,
    Up,
    Down,
}

impl Button {
    pub const ALL: [Button; 5] = [Button::A, Button::B, Button::C, Button::Up, Button::Down];

    /// Menu slot bound to a face button.
    pub fn slot(self) -> Option<usize> {
        match self {
            Button::A => Some(0),
            Button::B => Some(1),
            Button::C => Some(2),
            Button::Up | Button::Down => None,
        }
    }

    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonState {
    current: u8,
    previous: u8,
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, current: u8) {
        self.previous = self.current;
        self.current = current;
    }

    fn pressed(&self) -> u8 {
        self.current & !self.previous
    }

    pub fn is_down(&self, button: Button) -> bool {
        (self.current & button.mask()) != 0
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        (self.pressed() & button.mask()) != 0
    }

    pub fn any_down(&self) -> bool {
        self.current != 0
    }
}

/// The five badge buttons plus the wake latch that records which of them
/// powered the board up.
pub trait Keypad {
    /// Samples the buttons. A button that woke the board reports as pressed
    /// on the first poll after boot.
    fn poll(&mut self) -> ButtonState;

    /// Whether `button` was down when the board powered up.
    fn held_at_boot(&self, button: Button) -> bool;

    /// Forgets the held-at-boot latch so a consumed gesture is not replayed
    /// as presses.
    fn reset_held_at_boot(&mut self);

    /// Whether the current power-up was caused by a button press.
    fn woken_by_button(&self) -> bool;
}
