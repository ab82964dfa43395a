//! Open-ticket counts per casino group. Always computed from the tables,
//! never cached.

use crate::entities::{
    TicketEntity, TicketKind, cashins, cashouts, commissions, concerns, customer_supports,
    remittances, tasks,
};
use crate::error::AppResult;
use crate::models::PendingCounts;
use sea_orm::{ColumnTrait, ConnectionTrait, PaginatorTrait, QueryFilter};

pub async fn count_open<E: TicketEntity, C: ConnectionTrait>(
    db: &C,
    casino_group_id: &str,
) -> AppResult<u64> {
    let open = E::KIND.policy().open_statuses.iter().copied();
    let count = E::find()
        .filter(E::casino_group_column().eq(casino_group_id))
        .filter(E::status_column().is_in(open))
        .count(db)
        .await?;
    Ok(count)
}

pub async fn count_open_kind<C: ConnectionTrait>(
    db: &C,
    kind: TicketKind,
    casino_group_id: &str,
) -> AppResult<u64> {
    match kind {
        TicketKind::Cashin => count_open::<cashins::Entity, _>(db, casino_group_id).await,
        TicketKind::Cashout => count_open::<cashouts::Entity, _>(db, casino_group_id).await,
        TicketKind::Commission => count_open::<commissions::Entity, _>(db, casino_group_id).await,
        TicketKind::Concern => count_open::<concerns::Entity, _>(db, casino_group_id).await,
        TicketKind::CustomerSupport => {
            count_open::<customer_supports::Entity, _>(db, casino_group_id).await
        }
        TicketKind::Remittance => count_open::<remittances::Entity, _>(db, casino_group_id).await,
        TicketKind::Task => count_open::<tasks::Entity, _>(db, casino_group_id).await,
    }
}

pub async fn pending_counts<C: ConnectionTrait>(
    db: &C,
    casino_group_id: &str,
) -> AppResult<PendingCounts> {
    let mut counts = PendingCounts::default();
    for kind in TicketKind::ALL {
        let n = count_open_kind(db, kind, casino_group_id).await?;
        let slot = match kind {
            TicketKind::Cashin => &mut counts.cashin,
            TicketKind::Cashout => &mut counts.cashout,
            TicketKind::Commission => &mut counts.commission,
            TicketKind::Concern => &mut counts.concern,
            TicketKind::CustomerSupport => &mut counts.customer_support,
            TicketKind::Remittance => &mut counts.remittance,
            TicketKind::Task => &mut counts.task,
        };
        *slot = n;
        counts.total += n;
    }
    Ok(counts)
}
