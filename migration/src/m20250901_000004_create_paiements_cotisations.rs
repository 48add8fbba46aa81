use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum PaiementsCotisations {
    Table,
    Id,
    AdherentId,
    Montant,
    Methode,
    Statut,
    TypePaiement,
    StripeSessionId,
    PaypalOrderId,
    ReferenceVirement,
    CotisationMensuelleId,
    AssistanceId,
    DetteInitialeId,
    ObligationId,
    Description,
    Metadata,
    DatePaiement,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Adherents {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CotisationsMensuelles {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Assistances {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum DettesInitiales {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ObligationsCotisations {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("methode_paiement"))
                    .values(vec![
                        Alias::new("Stripe"),
                        Alias::new("PayPal"),
                        Alias::new("Virement"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("statut_paiement"))
                    .values(vec![
                        Alias::new("EnAttente"),
                        Alias::new("EnCours"),
                        Alias::new("Valide"),
                        Alias::new("Refuse"),
                        Alias::new("Annule"),
                    ])
                    .to_owned(),
            )
            .await?;
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("type_paiement"))
                    .values(vec![
                        Alias::new("cotisation_mensuelle"),
                        Alias::new("assistance"),
                        Alias::new("dette_initiale"),
                        Alias::new("obligation"),
                        Alias::new("adhesion"),
                        Alias::new("general"),
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaiementsCotisations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaiementsCotisations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::AdherentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::Montant)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::Methode)
                            .custom(Alias::new("methode_paiement"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::Statut)
                            .custom(Alias::new("statut_paiement"))
                            .not_null()
                            .default(Expr::cust("'EnCours'::statut_paiement")),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::TypePaiement)
                            .custom(Alias::new("type_paiement"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::StripeSessionId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::PaypalOrderId)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::ReferenceVirement)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::CotisationMensuelleId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::AssistanceId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::DetteInitialeId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::ObligationId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::Description)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(PaiementsCotisations::Metadata).json_binary().null())
                    .col(
                        ColumnDef::new(PaiementsCotisations::DatePaiement)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PaiementsCotisations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paiements_adherent")
                            .from(PaiementsCotisations::Table, PaiementsCotisations::AdherentId)
                            .to(Adherents::Table, Adherents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paiements_cotisation_mensuelle")
                            .from(
                                PaiementsCotisations::Table,
                                PaiementsCotisations::CotisationMensuelleId,
                            )
                            .to(CotisationsMensuelles::Table, CotisationsMensuelles::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paiements_assistance")
                            .from(PaiementsCotisations::Table, PaiementsCotisations::AssistanceId)
                            .to(Assistances::Table, Assistances::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paiements_dette_initiale")
                            .from(
                                PaiementsCotisations::Table,
                                PaiementsCotisations::DetteInitialeId,
                            )
                            .to(DettesInitiales::Table, DettesInitiales::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_paiements_obligation")
                            .from(PaiementsCotisations::Table, PaiementsCotisations::ObligationId)
                            .to(ObligationsCotisations::Table, ObligationsCotisations::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_paiements_adherent", PaiementsCotisations::AdherentId),
            ("idx_paiements_stripe_session", PaiementsCotisations::StripeSessionId),
            ("idx_paiements_paypal_order", PaiementsCotisations::PaypalOrderId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(PaiementsCotisations::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        // at most one payable item per payment
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE paiements_cotisations ADD CONSTRAINT ck_paiements_single_item \
                 CHECK (num_nonnulls(cotisation_mensuelle_id, assistance_id, dette_initiale_id, obligation_id) <= 1)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(PaiementsCotisations::Table)
                    .to_owned(),
            )
            .await?;
        for name in ["type_paiement", "statut_paiement", "methode_paiement"] {
            manager
                .drop_type(Type::drop().name(Alias::new(name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
