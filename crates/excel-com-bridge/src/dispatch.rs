//! Late-bound COM automation over IDispatch.
//!
//! Excel's object model is reached the way VBScript reaches it: look up a
//! member's DISPID by name, then `Invoke` it as a property get, property put
//! or method call.

#![cfg(windows)]

use std::mem::ManuallyDrop;
use std::ptr;

use windows::{
    core::{BSTR, GUID, HSTRING, PCWSTR},
    Win32::{
        Foundation::{DISP_E_EXCEPTION, VARIANT_BOOL},
        Globalization::GetSystemDefaultLCID,
        System::{
            Com::{
                CLSIDFromProgID, CoCreateInstance, IDispatch, CLSCTX_LOCAL_SERVER, DISPATCH_FLAGS,
                DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO,
            },
            Ole::DISPID_PROPERTYPUT,
            Variant::{VARIANT, VARENUM, VT_BOOL, VT_BSTR, VT_DISPATCH, VT_I2, VT_I4, VT_R8},
        },
    },
};

/// An argument passed to a COM member.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(&'a str),
}

impl Arg<'_> {
    fn to_variant(self) -> VARIANT {
        let mut v = VARIANT::default();
        // The union fields are ManuallyDrop, so they are written in place.
        unsafe {
            let inner = &mut *v.Anonymous.Anonymous;
            let vt = match self {
                Arg::Bool(b) => {
                    ptr::write(&mut inner.Anonymous.boolVal, VARIANT_BOOL(if b { -1 } else { 0 }));
                    VT_BOOL
                }
                Arg::Int(n) => {
                    ptr::write(&mut inner.Anonymous.lVal, n);
                    VT_I4
                }
                Arg::Float(x) => {
                    ptr::write(&mut inner.Anonymous.dblVal, x);
                    VT_R8
                }
                Arg::Str(s) => {
                    ptr::write(&mut inner.Anonymous.bstrVal, ManuallyDrop::new(BSTR::from(s)));
                    VT_BSTR
                }
            };
            ptr::write(&mut inner.vt, vt);
        }
        v
    }
}

fn vartype(v: &VARIANT) -> VARENUM {
    unsafe { v.Anonymous.Anonymous.vt }
}

/// A returned VARIANT read as text.
pub fn as_string(v: &VARIANT) -> Option<String> {
    (vartype(v) == VT_BSTR).then(|| unsafe { v.Anonymous.Anonymous.Anonymous.bstrVal.to_string() })
}

/// A returned VARIANT read as an integer. Excel reports counts as I4, I2 or R8
/// depending on version.
pub fn as_i32(v: &VARIANT) -> Option<i32> {
    let value = unsafe { &v.Anonymous.Anonymous.Anonymous };
    match vartype(v) {
        VT_I4 => Some(unsafe { value.lVal }),
        VT_I2 => Some(unsafe { value.iVal } as i32),
        VT_R8 => Some(unsafe { value.dblVal } as i32),
        _ => None,
    }
}

pub fn as_f64(v: &VARIANT) -> Option<f64> {
    match vartype(v) {
        VT_R8 => Some(unsafe { v.Anonymous.Anonymous.Anonymous.dblVal }),
        _ => as_i32(v).map(f64::from),
    }
}

fn as_dispatch(v: &VARIANT, member: &str) -> Result<Dispatch, String> {
    let vt = vartype(v);
    if vt != VT_DISPATCH {
        return Err(format!("'{member}' did not return an object (VT={})", vt.0));
    }
    unsafe { v.Anonymous.Anonymous.Anonymous.pdispVal.clone() }
        .map(Dispatch)
        .ok_or_else(|| format!("'{member}' returned a null object"))
}

/// An automation object.
#[derive(Clone)]
pub struct Dispatch(IDispatch);

impl Dispatch {
    /// Instantiate a registered ProgID such as `Excel.Application`.
    pub fn create(progid: &str) -> Result<Self, String> {
        let clsid = unsafe { CLSIDFromProgID(&HSTRING::from(progid)) }
            .map_err(|e| format!("ProgID '{progid}' is not registered: {e}"))?;
        let object: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }
            .map_err(|e| format!("Cannot create '{progid}': {e}"))?;
        Ok(Self(object))
    }

    pub fn get(&self, member: &str) -> Result<VARIANT, String> {
        self.invoke(member, DISPATCH_PROPERTYGET, &[])
    }

    pub fn put(&self, member: &str, value: Arg<'_>) -> Result<(), String> {
        self.invoke(member, DISPATCH_PROPERTYPUT, &[value]).map(drop)
    }

    pub fn call(&self, member: &str, args: &[Arg<'_>]) -> Result<VARIANT, String> {
        self.invoke(member, DISPATCH_METHOD, args)
    }

    /// Property whose value is another object, e.g. `app.Workbooks`.
    pub fn object(&self, member: &str) -> Result<Dispatch, String> {
        as_dispatch(&self.get(member)?, member)
    }

    /// Method returning an object, e.g. `Workbooks.Open(...)`.
    pub fn call_object(&self, member: &str, args: &[Arg<'_>]) -> Result<Dispatch, String> {
        as_dispatch(&self.call(member, args)?, member)
    }

    /// `collection.Item(key)` with a 1-based index or a name.
    pub fn item(&self, key: Arg<'_>) -> Result<Dispatch, String> {
        as_dispatch(&self.invoke("Item", DISPATCH_PROPERTYGET, &[key])?, "Item")
    }

    fn dispid(&self, member: &str) -> Result<i32, String> {
        let name: Vec<u16> = member.encode_utf16().chain(Some(0)).collect();
        let names = [PCWSTR(name.as_ptr())];
        let mut id = 0;
        unsafe {
            self.0
                .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, GetSystemDefaultLCID(), &mut id)
        }
        .map_err(|e| format!("No member '{member}': {e}"))?;
        Ok(id)
    }

    fn invoke(&self, member: &str, flags: DISPATCH_FLAGS, args: &[Arg<'_>]) -> Result<VARIANT, String> {
        let id = self.dispid(member)?;
        let is_put = flags == DISPATCH_PROPERTYPUT;

        // Arguments go in last-to-first
        let mut argv: Vec<VARIANT> = args.iter().rev().map(|a| a.to_variant()).collect();
        let mut put_id = DISPID_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: if argv.is_empty() { ptr::null_mut() } else { argv.as_mut_ptr() },
            rgdispidNamedArgs: if is_put { &mut put_id } else { ptr::null_mut() },
            cArgs: argv.len() as u32,
            cNamedArgs: is_put as u32,
        };

        let mut result = VARIANT::default();
        let mut exception = EXCEPINFO::default();
        unsafe {
            self.0.Invoke(
                id,
                &GUID::zeroed(),
                GetSystemDefaultLCID(),
                flags,
                &params,
                (!is_put).then_some(&mut result as *mut VARIANT),
                Some(&mut exception),
                None,
            )
        }
        .map_err(|e| describe_failure(member, &e, &exception))?;
        Ok(result)
    }
}

/// Excel reports its own errors through EXCEPINFO.
fn describe_failure(member: &str, err: &windows::core::Error, exception: &EXCEPINFO) -> String {
    if err.code() != DISP_E_EXCEPTION {
        return format!("{member} failed: {err}");
    }
    let text = |b: &BSTR, fallback: &str| {
        if b.is_empty() {
            fallback.to_string()
        } else {
            b.to_string()
        }
    };
    format!(
        "{member} raised: {} ({})",
        text(&exception.bstrDescription, "no description"),
        text(&exception.bstrSource, "unknown source"),
    )
}
