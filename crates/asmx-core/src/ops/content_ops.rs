use asmx_core_types::{ContainerId, ContentId, ProxyId};

use super::session::{ProxyRecord, Session};
use crate::errors::{AsmError, Result};
use crate::lifecycle::use_count::{ContentHandle, Hold, UseCell};
use crate::model::ContentObject;

/// Get the canonical proxy for `content` inside `container`
///
/// Repeated requests for the same pair return holders of the same proxy.
/// With `validate` set, the object's top-level owner must be a live object
/// of `container`; without it the proxy is created unchecked and simply
/// resolves to `None` if the object is not there.
///
/// Never touches the container's log.
///
/// # Errors
/// * `StaleContainer` - The container was swept
/// * `NotOwned` - Validation failed
pub fn get_or_create_proxy(
    session: &mut Session,
    container: ContainerId,
    content: ContentId,
    validate: bool,
) -> Result<ContentHandle> {
    let log = session.container(container)?.manager.log;

    if validate {
        let history = session.log_of(container)?;
        let owned = history.live(content).is_some()
            && history
                .top_level_owner(content)
                .is_some_and(|top| top.container == container);
        if !owned {
            return Err(AsmError::NotOwned {
                container_id: container,
                content_id: content,
            });
        }
    }

    if let Some(id) = session.proxy_index.get(&(container, content)) {
        let record = session.proxy(*id)?;
        return Ok(Hold::acquire(record.id, &record.uses));
    }

    let id = session.next_proxy_id();
    let uses = UseCell::new();
    let handle = Hold::acquire(id, &uses);
    session.proxies.insert(
        id,
        ProxyRecord {
            id,
            container,
            content,
            log,
            uses,
            released: false,
        },
    );
    session.proxy_index.insert((container, content), id);
    Ok(handle)
}

/// Re-derive the live object behind a proxy
///
/// `None` when the object has been rolled out of existence or the owning
/// container has been torn down. Absence is a normal outcome here.
pub fn resolve<'s>(session: &'s Session, proxy: &ContentHandle) -> Option<&'s ContentObject> {
    resolve_id(session, proxy.id())
}

pub(crate) fn resolve_id(session: &Session, proxy: ProxyId) -> Option<&ContentObject> {
    let record = session.proxies.get(&proxy)?;
    if record.released {
        return None;
    }
    session
        .logs
        .get(&record.log)?
        .live(record.content)
        .filter(|obj| obj.container == record.container)
}

/// True iff the proxy currently resolves
pub fn is_valid(session: &Session, proxy: &ContentHandle) -> bool {
    resolve(session, proxy).is_some()
}

/// Decouple every proxy of a container that is being torn down
///
/// Proxies stay in memory for their remaining holders but never resolve
/// again. Returns how many proxies were released.
pub fn release_owning_container(session: &mut Session, container: ContainerId) -> usize {
    let mut released = 0;
    for record in session.proxies.values_mut() {
        if record.container == container && !record.released {
            record.released = true;
            released += 1;
        }
    }
    session.proxy_index.retain(|(owner, _), _| *owner != container);
    released
}
