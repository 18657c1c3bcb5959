use super::{number_arg, string_arg};
use crate::error::InvocationError;
use crate::object::{Outcome, RemoteObject};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Pointer {
    x: f64,
    y: f64,
    pressed: bool,
    clicks: u64,
}

/// Pointer device of a page. Only reachable as `page.mouse`.
#[derive(Default)]
pub struct Mouse {
    pointer: Mutex<Pointer>,
}

#[async_trait]
impl RemoteObject for Mouse {
    fn class_name(&self) -> &str {
        "Mouse"
    }

    fn guid(&self) -> Option<&str> {
        None
    }

    async fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Outcome, InvocationError> {
        let mut pointer = self.pointer.lock().await;
        match member {
            "click" | "move" => {
                pointer.x = number_arg(member, &args, 0, "x")?;
                pointer.y = number_arg(member, &args, 1, "y")?;
                if member == "click" {
                    pointer.clicks += 1;
                }
                Ok(Outcome::null())
            }
            "down" => {
                pointer.pressed = true;
                Ok(Outcome::null())
            }
            "up" => {
                pointer.pressed = false;
                Ok(Outcome::null())
            }
            "position" => Ok(json!({
                "x": pointer.x,
                "y": pointer.y,
                "pressed": pointer.pressed,
                "clicks": pointer.clicks,
            })
            .into()),
            other => Err(InvocationError::no_such_member("Mouse", other)),
        }
    }
}

/// Keyboard of a page. Only reachable as `page.keyboard`.
#[derive(Default)]
pub struct Keyboard {
    typed: Mutex<String>,
}

#[async_trait]
impl RemoteObject for Keyboard {
    fn class_name(&self) -> &str {
        "Keyboard"
    }

    fn guid(&self) -> Option<&str> {
        None
    }

    async fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Outcome, InvocationError> {
        match member {
            "type" => {
                let text = string_arg(member, &args, 0, "text")?;
                self.typed.lock().await.push_str(&text);
                Ok(Outcome::null())
            }
            "press" => {
                let key = string_arg(member, &args, 0, "key")?;
                let mut typed = self.typed.lock().await;
                match key.as_str() {
                    "Enter" => typed.push('\n'),
                    "Tab" => typed.push('\t'),
                    "Backspace" => {
                        typed.pop();
                    }
                    single if single.chars().count() == 1 => typed.push_str(single),
                    // modifiers and navigation keys leave no text
                    _ => {}
                }
                Ok(Outcome::null())
            }
            "typed" => Ok(json!(*self.typed.lock().await).into()),
            other => Err(InvocationError::no_such_member("Keyboard", other)),
        }
    }
}
