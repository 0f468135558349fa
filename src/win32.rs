//! [`Host`] backed by Win32 popups, GDI regions and layered windows.
//!
//! Window procedures and the WinEvent hook run inside the message pump and
//! only queue raw events; [`Win32Host::poll_events`] pumps pending messages
//! and translates the queue into [`HostEvent`]s on the calling thread.

use std::collections::{HashMap, HashSet, VecDeque};
use std::mem;
use std::ptr;
use std::sync::{Mutex, Once};
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::{debug, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{COLORREF, HANDLE, HWND, LPARAM, LRESULT, POINT, RECT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, ClientToScreen, CombineRgn, CreateCompatibleDC, CreateDIBSection, CreateFontW,
    CreateRectRgn, DeleteDC, DeleteObject, DrawTextW, EndPaint, GetDC, GetMonitorInfoW,
    InvalidateRect, MonitorFromRect, ReleaseDC, SelectObject, SetBkMode, SetDIBitsToDevice,
    SetTextColor, SetWindowRgn, AC_SRC_ALPHA, AC_SRC_OVER, BITMAPINFO, BITMAPINFOHEADER, BI_RGB,
    BLENDFUNCTION, CLEARTYPE_QUALITY, CLIP_DEFAULT_PRECIS, DEFAULT_CHARSET, DIB_RGB_COLORS,
    DRAW_TEXT_FORMAT, DT_CALCRECT, DT_END_ELLIPSIS, DT_NOPREFIX, DT_SINGLELINE, DT_WORDBREAK,
    FF_SWISS, FW_BOLD, FW_NORMAL, HDC, HFONT, HRGN, MONITORINFO, MONITOR_DEFAULTTONEAREST,
    OUT_DEFAULT_PRECIS, PAINTSTRUCT, RGN_OR, TRANSPARENT, VARIABLE_PITCH,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetAncestor, GetClientRect,
    GetDesktopWindow, GetWindowLongW, IsWindow, KillTimer, PeekMessageW, RegisterClassW,
    SetTimer, SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateMessage,
    EVENT_OBJECT_HIDE, EVENT_OBJECT_LOCATIONCHANGE, EVENT_OBJECT_SHOW, GA_PARENT, GA_ROOT,
    GWLP_HWNDPARENT, GWL_STYLE, HWND_TOPMOST, MSG, OBJID_WINDOW, PM_REMOVE, SWP_NOACTIVATE,
    SW_HIDE, SW_SHOWNOACTIVATE, ULW_ALPHA, WINDOW_EX_STYLE, WINDOW_STYLE, WINEVENT_OUTOFCONTEXT,
    WM_CLOSE, WM_ERASEBKGND, WM_LBUTTONUP, WM_PAINT, WM_TIMER, WNDCLASSW, WS_EX_LAYERED,
    WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP, WS_VISIBLE,
    UpdateLayeredWindow,
};

use crate::error::{BalloonError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::host::{
    ElementChange, ElementEvent, ElementId, ElementInfo, Host, HostEvent, SubscriptionId,
    TextRun, TimerId, WindowId, WindowKind,
};
use crate::message::TextMeasure;
use crate::region::Region;
use crate::render::{convert_rgba_to_dib_bgra, Bitmap, RgbaBuffer};

const CLASS_NAME: PCWSTR = w!("BalloonWindowPopup");
const FONT_HEIGHT: i32 = -12;

#[derive(Debug, Clone, Copy)]
enum RawEvent {
    Close(isize),
    Click(isize, Point),
    Timer(isize, usize),
    Element(isize, ElementChange),
}

struct PaintedFrame {
    width: i32,
    height: i32,
    bgra: Vec<u8>,
    text: Vec<TextRun>,
}

static EVENTS: Lazy<Mutex<VecDeque<RawEvent>>> = Lazy::new(|| Mutex::new(VecDeque::new()));
static FRAMES: Lazy<Mutex<HashMap<isize, PaintedFrame>>> = Lazy::new(|| Mutex::new(HashMap::new()));
/// Windows with at least one live subscription. The hook drops everything else.
static WATCHED: Lazy<Mutex<HashSet<isize>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn push_event(event: RawEvent) {
    if let Ok(mut events) = EVENTS.lock() {
        events.push_back(event);
    }
}

/// Queues an element change for a watched window. A move already waiting in
/// the queue for the same window absorbs later ones.
fn queue_element_event(
    events: &mut VecDeque<RawEvent>,
    watched: &HashSet<isize>,
    hwnd: isize,
    change: ElementChange,
) -> bool {
    if !watched.contains(&hwnd) {
        return false;
    }
    if matches!(change, ElementChange::Moved)
        && events
            .iter()
            .any(|queued| matches!(queued, RawEvent::Element(h, ElementChange::Moved) if *h == hwnd))
    {
        return false;
    }
    events.push_back(RawEvent::Element(hwnd, change));
    true
}

fn host_error(context: &str, err: impl std::fmt::Display) -> BalloonError {
    BalloonError::Host {
        message: format!("{context}: {err}"),
    }
}

fn hwnd_key(hwnd: HWND) -> isize {
    hwnd.0 as isize
}

fn hwnd_from_element(element: ElementId) -> HWND {
    HWND(element.0 as usize as *mut _)
}

fn to_rect(rc: RECT) -> Rect {
    Rect::from_ltrb(rc.left, rc.top, rc.right, rc.bottom)
}

fn to_win_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.left(),
        top: rect.top(),
        right: rect.right(),
        bottom: rect.bottom(),
    }
}

fn colorref(color: crate::render::Color) -> COLORREF {
    COLORREF((color.r as u32) | ((color.g as u32) << 8) | ((color.b as u32) << 16))
}

fn create_font(bold: bool) -> HFONT {
    let weight = if bold { FW_BOLD.0 } else { FW_NORMAL.0 };
    unsafe {
        CreateFontW(
            FONT_HEIGHT,
            0,
            0,
            0,
            weight as i32,
            0,
            0,
            0,
            DEFAULT_CHARSET,
            OUT_DEFAULT_PRECIS,
            CLIP_DEFAULT_PRECIS,
            CLEARTYPE_QUALITY,
            (VARIABLE_PITCH.0 | FF_SWISS.0) as u32,
            w!("Segoe UI"),
        )
    }
}

fn text_flags(bold: bool) -> DRAW_TEXT_FORMAT {
    if bold {
        DT_SINGLELINE | DT_END_ELLIPSIS | DT_NOPREFIX
    } else {
        DT_WORDBREAK | DT_END_ELLIPSIS | DT_NOPREFIX
    }
}

unsafe extern "system" fn balloon_wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_ERASEBKGND => LRESULT(1),
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = unsafe { BeginPaint(hwnd, &mut ps) };
            if !hdc.0.is_null() {
                if let Ok(frames) = FRAMES.lock() {
                    if let Some(frame) = frames.get(&hwnd_key(hwnd)) {
                        unsafe { paint_frame(hdc, frame) };
                    }
                }
            }
            unsafe {
                let _ = EndPaint(hwnd, &ps);
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            push_event(RawEvent::Close(hwnd_key(hwnd)));
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            let x = (lparam.0 & 0xffff) as i16 as i32;
            let y = ((lparam.0 >> 16) & 0xffff) as i16 as i32;
            push_event(RawEvent::Click(hwnd_key(hwnd), Point::new(x, y)));
            LRESULT(0)
        }
        WM_TIMER => {
            push_event(RawEvent::Timer(hwnd_key(hwnd), wparam.0));
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

unsafe fn paint_frame(hdc: HDC, frame: &PaintedFrame) {
    let mut bmi = BITMAPINFO::default();
    bmi.bmiHeader = BITMAPINFOHEADER {
        biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
        biWidth: frame.width,
        biHeight: -frame.height,
        biPlanes: 1,
        biBitCount: 32,
        biCompression: BI_RGB.0,
        ..Default::default()
    };
    unsafe {
        SetDIBitsToDevice(
            hdc,
            0,
            0,
            frame.width as u32,
            frame.height as u32,
            0,
            0,
            0,
            frame.height as u32,
            frame.bgra.as_ptr() as *const _,
            &bmi,
            DIB_RGB_COLORS,
        );
        SetBkMode(hdc, TRANSPARENT);
    }
    for run in &frame.text {
        let font = create_font(run.bold);
        let mut text: Vec<u16> = run.text.encode_utf16().collect();
        let mut rc = to_win_rect(run.bounds);
        unsafe {
            let previous = SelectObject(hdc, font);
            SetTextColor(hdc, colorref(run.color));
            DrawTextW(hdc, &mut text, &mut rc, text_flags(run.bold));
            SelectObject(hdc, previous);
            let _ = DeleteObject(font);
        }
    }
}

unsafe extern "system" fn win_event_proc(
    _hook: HWINEVENTHOOK,
    event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _thread: u32,
    _time: u32,
) {
    if id_object != OBJID_WINDOW.0 || hwnd.0.is_null() {
        return;
    }
    let change = match event {
        EVENT_OBJECT_LOCATIONCHANGE => ElementChange::Moved,
        EVENT_OBJECT_SHOW => ElementChange::VisibilityChanged(true),
        EVENT_OBJECT_HIDE => ElementChange::VisibilityChanged(false),
        _ => return,
    };
    let Ok(watched) = WATCHED.lock() else {
        return;
    };
    if let Ok(mut events) = EVENTS.lock() {
        queue_element_event(&mut events, &watched, hwnd_key(hwnd), change);
    }
}

fn register_class() -> Result<windows::Win32::Foundation::HINSTANCE> {
    static REGISTER_CLASS: Once = Once::new();
    let module = unsafe { GetModuleHandleW(PCWSTR::null()) }.map_err(|e| host_error("module handle", e))?;
    let instance = module.into();
    REGISTER_CLASS.call_once(|| unsafe {
        let wc = WNDCLASSW {
            hInstance: instance,
            lpszClassName: CLASS_NAME,
            lpfnWndProc: Some(balloon_wndproc),
            ..Default::default()
        };
        let _ = RegisterClassW(&wc);
    });
    Ok(instance)
}

pub fn window_ex_style(kind: WindowKind) -> WINDOW_EX_STYLE {
    let base = WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE;
    match kind {
        WindowKind::Balloon => base,
        WindowKind::Shadow => base | WS_EX_LAYERED | WS_EX_TRANSPARENT,
    }
}

/// Builds an `HRGN` covering every span of `region`.
fn region_handle(region: &Region) -> HRGN {
    unsafe {
        let combined = CreateRectRgn(0, 0, 0, 0);
        for span in region.spans() {
            let part = CreateRectRgn(span.left(), span.top(), span.right(), span.bottom());
            let _ = CombineRgn(combined, combined, part, RGN_OR);
            let _ = DeleteObject(part);
        }
        combined
    }
}

#[derive(Debug, Default)]
pub struct Win32Host {
    windows: HashMap<WindowId, isize>,
    subscriptions: HashMap<SubscriptionId, ElementId>,
    next_subscription: u64,
    timers: HashMap<TimerId, (isize, usize)>,
    next_timer: u64,
    hook: Option<isize>,
}

impl Win32Host {
    pub fn new() -> Self {
        Self::default()
    }

    fn hwnd(&self, window: WindowId) -> Result<HWND> {
        self.windows
            .get(&window)
            .map(|key| HWND(*key as *mut _))
            .ok_or_else(|| BalloonError::Host {
                message: format!("unknown window {}", window.0),
            })
    }

    fn ensure_hook(&mut self) {
        if self.hook.is_some() {
            return;
        }
        let hook = unsafe {
            SetWinEventHook(
                EVENT_OBJECT_SHOW,
                EVENT_OBJECT_LOCATIONCHANGE,
                None,
                Some(win_event_proc),
                0,
                0,
                WINEVENT_OUTOFCONTEXT,
            )
        };
        if hook.0.is_null() {
            warn!("SetWinEventHook failed; element tracking disabled");
            return;
        }
        debug!("win event hook installed");
        self.hook = Some(hook.0 as isize);
    }

    fn sync_watched(&self) {
        if let Ok(mut watched) = WATCHED.lock() {
            watched.clear();
            watched.extend(self.subscriptions.values().map(|element| element.0 as isize));
        }
    }

    fn release_hook(&mut self) {
        if let Some(hook) = self.hook.take() {
            unsafe {
                let _ = UnhookWinEvent(HWINEVENTHOOK(hook as *mut _));
            }
            debug!("win event hook removed");
        }
    }

    fn pump_messages() {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).into() {
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            }
        }
    }
}

impl Drop for Win32Host {
    fn drop(&mut self) {
        self.release_hook();
        let windows: Vec<WindowId> = self.windows.keys().copied().collect();
        for window in windows {
            self.destroy_window(window);
        }
    }
}

impl Host for Win32Host {
    fn create_window(&mut self, kind: WindowKind) -> Result<WindowId> {
        let instance = register_class()?;
        let hwnd = unsafe {
            CreateWindowExW(
                window_ex_style(kind),
                CLASS_NAME,
                PCWSTR::null(),
                WINDOW_STYLE(WS_POPUP.0),
                0,
                0,
                1,
                1,
                None,
                None,
                instance,
                None,
            )
        }
        .map_err(|e| host_error("create window", e))?;
        let id = WindowId(hwnd_key(hwnd) as u64);
        self.windows.insert(id, hwnd_key(hwnd));
        debug!(window = id.0, kind = ?kind, "native window created");
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        let Some(key) = self.windows.remove(&window) else {
            return;
        };
        if let Ok(mut frames) = FRAMES.lock() {
            frames.remove(&key);
        }
        self.timers.retain(|_, (owner, _)| *owner != key);
        unsafe {
            let _ = DestroyWindow(HWND(key as *mut _));
        }
    }

    fn set_window_bounds(&mut self, window: WindowId, bounds: Rect) -> Result<()> {
        let hwnd = self.hwnd(window)?;
        unsafe {
            SetWindowPos(
                hwnd,
                HWND_TOPMOST,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                SWP_NOACTIVATE,
            )
        }
        .map_err(|e| host_error("set window bounds", e))
    }

    fn set_window_visible(&mut self, window: WindowId, visible: bool) -> Result<()> {
        let hwnd = self.hwnd(window)?;
        unsafe {
            let _ = ShowWindow(hwnd, if visible { SW_SHOWNOACTIVATE } else { SW_HIDE });
        }
        Ok(())
    }

    fn set_window_owner(&mut self, window: WindowId, owner: Option<ElementId>) -> Result<()> {
        let hwnd = self.hwnd(window)?;
        let root = owner.map_or(0, |element| unsafe {
            GetAncestor(hwnd_from_element(element), GA_ROOT).0 as isize
        });
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_HWNDPARENT, root);
        }
        Ok(())
    }

    fn set_window_region(&mut self, window: WindowId, region: &Region) -> Result<()> {
        let hwnd = self.hwnd(window)?;
        let rgn = region_handle(region);
        // The system owns the region once SetWindowRgn succeeds.
        if unsafe { SetWindowRgn(hwnd, rgn, true) } == 0 {
            unsafe {
                let _ = DeleteObject(rgn);
            }
            return Err(BalloonError::Host {
                message: "SetWindowRgn failed".into(),
            });
        }
        Ok(())
    }

    fn present_frame(&mut self, window: WindowId, frame: &RgbaBuffer, text: &[TextRun]) -> Result<()> {
        let hwnd = self.hwnd(window)?;
        let mut bgra = vec![0u8; frame.pixels.len()];
        convert_rgba_to_dib_bgra(&frame.pixels, &mut bgra);
        if let Ok(mut frames) = FRAMES.lock() {
            frames.insert(
                hwnd_key(hwnd),
                PaintedFrame {
                    width: frame.width as i32,
                    height: frame.height as i32,
                    bgra,
                    text: text.to_vec(),
                },
            );
        }
        unsafe {
            let _ = InvalidateRect(hwnd, None, false);
        }
        Ok(())
    }

    fn update_layered(&mut self, window: WindowId, location: Point, bitmap: &Bitmap, opacity: u8) -> Result<()> {
        let hwnd = self.hwnd(window)?;
        unsafe {
            let screen_dc = GetDC(HWND::default());
            let mem_dc = CreateCompatibleDC(screen_dc);
            let mut bmi = BITMAPINFO::default();
            bmi.bmiHeader = BITMAPINFOHEADER {
                biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: bitmap.width as i32,
                biHeight: -(bitmap.height as i32),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            };
            let mut bits: *mut core::ffi::c_void = ptr::null_mut();
            let dib = match CreateDIBSection(mem_dc, &bmi, DIB_RGB_COLORS, &mut bits, HANDLE::default(), 0) {
                Ok(dib) if !bits.is_null() => dib,
                _ => {
                    let _ = DeleteDC(mem_dc);
                    ReleaseDC(HWND::default(), screen_dc);
                    return Err(BalloonError::Host {
                        message: "CreateDIBSection failed".into(),
                    });
                }
            };
            ptr::copy_nonoverlapping(bitmap.data.as_ptr(), bits as *mut u8, bitmap.data.len());
            let previous = SelectObject(mem_dc, dib);

            let dest = POINT {
                x: location.x,
                y: location.y,
            };
            let size = SIZE {
                cx: bitmap.width as i32,
                cy: bitmap.height as i32,
            };
            let source = POINT { x: 0, y: 0 };
            let blend = BLENDFUNCTION {
                BlendOp: AC_SRC_OVER as u8,
                BlendFlags: 0,
                SourceConstantAlpha: opacity,
                AlphaFormat: AC_SRC_ALPHA as u8,
            };
            let result = UpdateLayeredWindow(
                hwnd,
                screen_dc,
                Some(&dest),
                Some(&size),
                mem_dc,
                Some(&source),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(dib);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);
            result.map_err(|e| host_error("UpdateLayeredWindow", e))
        }
    }

    fn monitor_bounds(&self, area: Rect) -> Rect {
        let rc = to_win_rect(area);
        unsafe {
            let monitor = MonitorFromRect(&rc, MONITOR_DEFAULTTONEAREST);
            let mut info = MONITORINFO {
                cbSize: mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if GetMonitorInfoW(monitor, &mut info).as_bool() {
                to_rect(info.rcMonitor)
            } else {
                Rect::default()
            }
        }
    }

    fn element(&self, element: ElementId) -> Option<ElementInfo> {
        let hwnd = hwnd_from_element(element);
        unsafe {
            if !IsWindow(hwnd).as_bool() {
                return None;
            }
            let mut client = RECT::default();
            GetClientRect(hwnd, &mut client).ok()?;
            let mut origin = POINT::default();
            if !ClientToScreen(hwnd, &mut origin).as_bool() {
                return None;
            }
            let visible = (GetWindowLongW(hwnd, GWL_STYLE) as u32) & WS_VISIBLE.0 != 0;
            let parent = GetAncestor(hwnd, GA_PARENT);
            let parent = if parent.0.is_null() || parent == GetDesktopWindow() {
                None
            } else {
                Some(ElementId(hwnd_key(parent) as u64))
            };
            Some(ElementInfo {
                screen_bounds: Rect::new(origin.x, origin.y, client.right - client.left, client.bottom - client.top),
                visible,
                parent,
            })
        }
    }

    fn subscribe(&mut self, element: ElementId) -> Result<SubscriptionId> {
        self.ensure_hook();
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.insert(id, element);
        self.sync_watched();
        Ok(id)
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
        self.sync_watched();
        if self.subscriptions.is_empty() {
            self.release_hook();
        }
    }

    fn arm_timer(&mut self, window: WindowId, after: Duration) -> Result<TimerId> {
        let hwnd = self.hwnd(window)?;
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        let millis = after.as_millis().min(u32::MAX as u128) as u32;
        if unsafe { SetTimer(hwnd, self.next_timer as usize, millis, None) } == 0 {
            return Err(BalloonError::Host {
                message: "SetTimer failed".into(),
            });
        }
        self.timers.insert(id, (hwnd_key(hwnd), self.next_timer as usize));
        Ok(id)
    }

    fn cancel_timer(&mut self, timer: TimerId) {
        if let Some((hwnd, native)) = self.timers.remove(&timer) {
            unsafe {
                let _ = KillTimer(HWND(hwnd as *mut _), native);
            }
        }
    }

    fn poll_events(&mut self) -> Vec<HostEvent> {
        Self::pump_messages();
        let raw: Vec<RawEvent> = match EVENTS.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => return Vec::new(),
        };

        let mut out = Vec::new();
        for event in raw {
            match event {
                RawEvent::Close(hwnd) => out.push(HostEvent::CloseRequested(WindowId(hwnd as u64))),
                RawEvent::Click(hwnd, point) => out.push(HostEvent::Click {
                    window: WindowId(hwnd as u64),
                    point,
                }),
                RawEvent::Timer(hwnd, native) => {
                    let fired = self
                        .timers
                        .iter()
                        .find(|(_, (owner, id))| *owner == hwnd && *id == native)
                        .map(|(timer, _)| *timer);
                    if let Some(timer) = fired {
                        // Native timers repeat; balloons expect one shot.
                        self.cancel_timer(timer);
                        out.push(HostEvent::Timer(timer));
                    }
                }
                RawEvent::Element(hwnd, change) => {
                    let element = ElementId(hwnd as u64);
                    for (subscription, watched) in &self.subscriptions {
                        if *watched == element {
                            out.push(HostEvent::Element(ElementEvent {
                                subscription: *subscription,
                                element,
                                change,
                            }));
                        }
                    }
                }
            }
        }
        out
    }
}

impl TextMeasure for Win32Host {
    fn measure(&self, text: &str, max_width: Option<i32>, bold: bool) -> Size {
        let mut buffer: Vec<u16> = text.encode_utf16().collect();
        let mut rc = RECT {
            left: 0,
            top: 0,
            right: max_width.unwrap_or(0),
            bottom: 0,
        };
        let mut flags = DT_CALCRECT | DT_NOPREFIX;
        if max_width.is_some() {
            flags |= DT_WORDBREAK;
        }
        unsafe {
            let hdc = GetDC(HWND::default());
            let font = create_font(bold);
            let previous = SelectObject(hdc, font);
            DrawTextW(hdc, &mut buffer, &mut rc, flags);
            SelectObject(hdc, previous);
            let _ = DeleteObject(font);
            ReleaseDC(HWND::default(), hdc);
        }
        Size::new(rc.right - rc.left, rc.bottom - rc.top)
    }
}
