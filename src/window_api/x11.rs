use std::sync::Arc;

use anyhow::{anyhow, Result};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::instrument;
use xcb::{
    x::{self, Atom, GetProperty, InternAtom, Window, ATOM_ANY},
    Connection, Xid,
};

use super::{app_name_from_executable, ForegroundSampler};

fn intern_atom(conn: &Connection, name: &[u8]) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name,
    }))?;
    Ok(reply.atom())
}

fn get_active_window(conn: &Connection, root: Window, active_window_atom: Atom) -> Result<Option<Window>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window: root,
        property: active_window_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(result
        .value::<Window>()
        .first()
        .copied()
        .filter(|window| !window.is_none()))
}

fn get_pid(conn: &Connection, window: Window, pid_atom: Atom) -> Result<Option<u32>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property: pid_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(result.value::<u32>().first().copied())
}

/// Reads `WM_CLASS`, used when a window doesn't advertise its pid.
fn get_class_name(conn: &Connection, window: Window) -> Result<Option<String>> {
    let result = conn.wait_for_reply(conn.send_request(&x::GetProperty {
        delete: false,
        window,
        property: x::ATOM_WM_CLASS,
        r#type: x::ATOM_STRING,
        long_offset: 0,
        long_length: 256,
    }))?;
    // WM_CLASS holds "instance\0class\0", the class part is the readable one.
    let class = result
        .value::<u8>()
        .split(|v| *v == 0)
        .filter(|v| !v.is_empty())
        .last()
        .map(|v| String::from_utf8_lossy(v).into_owned());
    Ok(class)
}

pub struct X11Sampler {
    connection: Connection,
    preferred_screen: usize,
    active_window_atom: Atom,
    pid_atom: Atom,
    system: System,
}

impl X11Sampler {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = intern_atom(&connection, b"_NET_ACTIVE_WINDOW")?;
        let pid_atom = intern_atom(&connection, b"_NET_WM_PID")?;
        Ok(Self {
            connection,
            preferred_screen: preferred_screen.max(0) as usize,
            active_window_atom,
            pid_atom,
            system: System::new(),
        })
    }

    fn process_name(&mut self, pid: u32) -> Option<Arc<str>> {
        let pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_exe(sysinfo::UpdateKind::OnlyIfNotSet),
        );
        let process = self.system.process(pid)?;
        process
            .exe()
            .and_then(|v| v.to_str())
            .and_then(app_name_from_executable)
            .or_else(|| Some(process.name().to_string_lossy().into()))
    }
}

impl ForegroundSampler for X11Sampler {
    #[instrument(skip(self))]
    fn current_foreground_app(&mut self) -> Result<Option<Arc<str>>> {
        let root = self
            .connection
            .get_setup()
            .roots()
            .nth(self.preferred_screen)
            .ok_or_else(|| anyhow!("X11 screen {} is not available", self.preferred_screen))?
            .root();

        let Some(window) = get_active_window(&self.connection, root, self.active_window_atom)?
        else {
            return Ok(None);
        };

        if let Some(pid) = get_pid(&self.connection, window, self.pid_atom)? {
            if let Some(name) = self.process_name(pid) {
                return Ok(Some(name));
            }
        }

        Ok(get_class_name(&self.connection, window)?.map(Into::into))
    }
}
