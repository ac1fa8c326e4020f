//! Tauri commands for preferences and the contact form.

use std::sync::Arc;

use serde::Serialize;
use tauri::State;

use crate::contact::{ContactForm, ContactService, ContactStatus};
use crate::i18n::I18n;
use crate::prefs::{Language, Preferences, SiteContext};

/// Contact service, or the reason it could not be configured.
pub struct ContactState {
    service: Result<Arc<ContactService>, String>,
}

impl ContactState {
    pub fn new(service: crate::error::Result<ContactService>) -> Self {
        Self {
            service: service.map(Arc::new).map_err(|e| e.to_string()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReply {
    pub status: ContactStatus,
    /// Status text in the visitor's language
    pub message: String,
    /// The form after submission: cleared on success, untouched otherwise
    pub form: ContactForm,
}

#[tauri::command]
pub fn prefs_get(site: State<'_, SiteContext>) -> Preferences {
    site.preferences()
}

#[tauri::command]
pub fn prefs_toggle_theme(site: State<'_, SiteContext>) -> Preferences {
    site.toggle_theme()
}

#[tauri::command]
pub fn prefs_set_language(language: Language, site: State<'_, SiteContext>) -> Preferences {
    site.set_language(language)
}

#[tauri::command]
pub async fn contact_submit(
    form: ContactForm,
    contact: State<'_, ContactState>,
    site: State<'_, SiteContext>,
) -> Result<ContactReply, String> {
    let service = contact.service.clone()?;
    let language = site.language();

    let (status, form) = tauri::async_runtime::spawn_blocking(move || {
        let mut form = form;
        let status = service.submit(&mut form);
        (status, form)
    })
    .await
    .map_err(|e| e.to_string())?;

    Ok(ContactReply {
        status,
        message: status.message(&I18n::new(language)),
        form,
    })
}
