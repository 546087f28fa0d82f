use std::sync::Mutex;

use crate::number::Number;

/// The running "last answer" value.
///
/// Shared by every channel and user (a single calculator tape). Reads and
/// writes are each atomic; the read-evaluate-write sequence as a whole is
/// not, so a trigger that starts before another one advances the register
/// evaluates against the older value.
pub struct AnsRegister {
    value: Mutex<Number>,
}

impl AnsRegister {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(Number::zero()),
        }
    }

    pub fn get(&self) -> Number {
        *self.value.lock().expect("ans register poisoned")
    }

    pub fn set(&self, value: Number) {
        *self.value.lock().expect("ans register poisoned") = value;
    }
}

impl Default for AnsRegister {
    fn default() -> Self {
        Self::new()
    }
}
