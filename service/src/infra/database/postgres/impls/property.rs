//! [`Property`]-related [`Database`] implementations.
//!
//! A [`Property`] spans its base row and exactly one detail row, so it's
//! mapped by hand instead of being a [`Table`].
//!
//! [`Table`]: crate::infra::database::postgres::Table

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Page,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, Commercial, Detail, Residential},
        Property,
    },
    infra::{
        database::{
            self,
            postgres::{
                table::{borrow, count, Params},
                Connection, FuzzPattern,
            },
            Postgres,
        },
        Database,
    },
    read,
};

/// Selected columns of a joined [`Property`].
const SELECT: &str = "\
    SELECT p.id, p.tax_id, p.address, p.status_id, p.price, \
           p.lot_size, p.year_built, p.zoning, p.property_tax, p.image, \
           p.property_type_id, p.created_at, p.updated_at, \
           r.property_id AS r_property_id, r.bedrooms, r.bathrooms, \
           r.building_type AS r_building_type, \
           r.square_feet AS r_square_feet, \
           r.garage_spaces, r.has_basement, r.has_pool, \
           c.property_id AS c_property_id, \
           c.square_feet AS c_square_feet, c.industry, \
           c.building_type AS c_building_type, \
           c.units, c.parking_spaces, c.zoning_type \
    FROM properties AS p \
    LEFT JOIN residential_properties AS r ON r.property_id = p.id \
    LEFT JOIN commercial_properties AS c ON c.property_id = p.id";

/// Maps a `row` selected with [`SELECT`].
fn from_row(row: &Row) -> Result<Property, database::Error> {
    let id: property::Id = row.get("id");
    let kind: property::Kind = row.get("property_type_id");
    let residential = row.get::<_, Option<property::Id>>("r_property_id");
    let commercial = row.get::<_, Option<property::Id>>("c_property_id");

    let detail = match (kind, residential, commercial) {
        (property::Kind::Residential, Some(_), None) => {
            Detail::Residential(Residential {
                bedrooms: count(row, "bedrooms")?,
                bathrooms: row.get("bathrooms"),
                kind: row.get("r_building_type"),
                square_feet: row.get("r_square_feet"),
                garage_spaces: count(row, "garage_spaces")?,
                has_basement: row.get("has_basement"),
                has_pool: row.get("has_pool"),
            })
        }
        (property::Kind::Commercial, None, Some(_)) => {
            Detail::Commercial(Commercial {
                square_feet: row.get("c_square_feet"),
                industry: row.get("industry"),
                kind: row.get("c_building_type"),
                units: count(row, "units")?,
                parking_spaces: count(row, "parking_spaces")?,
                zoning_type: row.get("zoning_type"),
            })
        }
        _ => {
            return Err(database::Error::Integrity(format!(
                "`Property(id: {id})` must have exactly one {kind} detail",
            )));
        }
    };

    let year_built = row
        .get::<_, Option<i32>>("year_built")
        .map(u16::try_from)
        .transpose()
        .map_err(|_| {
            database::Error::Integrity("`year_built` is out of range".into())
        })?;

    Ok(Property {
        id,
        tax_id: row.get("tax_id"),
        address: row.get("address"),
        status: row.get("status_id"),
        price: row.get("price"),
        lot_size: row.get("lot_size"),
        year_built,
        zoning: row.get("zoning"),
        property_tax: row.get("property_tax"),
        image: row.get("image"),
        detail,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Maps the provided `rows` selected with [`SELECT`].
fn from_rows(rows: &[Row]) -> Result<Vec<Property>, Traced<database::Error>> {
    rows.iter()
        .map(from_row)
        .collect::<Result<_, _>>()
        .map_err(tracerr::wrap!())
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let sql = format!("{SELECT} WHERE p.id = $1");
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .transpose()
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Property>, property::TaxId>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::TaxId>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tax_id = by.into_inner();
        let sql = format!("{SELECT} WHERE p.tax_id = $1");
        self.query_opt(&sql, &[&tax_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row)
            .transpose()
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Page<Property>, read::property::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Page<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Page<Property>, read::property::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Selector { pagination, filter } = by.into_inner();

        let mut params: Params = Vec::new();
        let mut conditions = vec!["TRUE".to_owned()];
        if let Some(status) = filter.status {
            params.push(Box::new(status));
            conditions.push(format!("p.status_id = ${}", params.len()));
        }
        if let Some(kind) = filter.kind {
            params.push(Box::new(kind));
            conditions.push(format!("p.property_type_id = ${}", params.len()));
        }
        if let Some(agent) = filter.listed_by {
            params.push(Box::new(agent));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM listings AS l \
                         WHERE l.property_id = p.id AND l.agent_id = ${})",
                params.len(),
            ));
        }
        let condition = conditions.join(" AND ");

        let sql = format!(
            "SELECT COUNT(*) AS total FROM properties AS p WHERE {condition}",
        );
        let total = self
            .query_opt(&sql, &borrow(&params))
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("total"));

        let n = params.len();
        params.push(Box::new(i64::from(pagination.limit())));
        params.push(Box::new(
            i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
        ));
        let sql = format!(
            "{SELECT} WHERE {condition} \
             ORDER BY p.created_at DESC, p.id \
             LIMIT ${} OFFSET ${}",
            n + 1,
            n + 2,
        );
        let rows = self
            .query(&sql, &borrow(&params))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Page::new(
            pagination,
            from_rows(&rows)?,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}

impl<C> Database<Select<By<Page<Property>, read::property::Search>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Page<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Page<Property>, read::property::Search>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Search { query, pagination } = by.into_inner();
        let pattern = FuzzPattern::new(&query);
        if pattern.is_empty() {
            return Ok(Page::new(pagination, vec![], 0));
        }

        const COUNT_SQL: &str = "\
            SELECT COUNT(*) AS total \
            FROM properties \
            WHERE address ILIKE ANY($1::TEXT[])";
        let total = self
            .query_opt(COUNT_SQL, &[&pattern])
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i64>("total"));

        let limit = i64::from(pagination.limit());
        let offset = i64::try_from(pagination.offset()).unwrap_or(i64::MAX);
        let sql = format!(
            "{SELECT} WHERE p.address ILIKE ANY($1::TEXT[]) \
             ORDER BY LEVENSHTEIN(LOWER(LEFT(p.address, 255)), \
                                  LOWER(LEFT($2, 255))), \
                      p.id \
             LIMIT $3 OFFSET $4",
        );
        let rows = self
            .query(&sql, &[&pattern, &query, &limit, &offset])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Page::new(
            pagination,
            from_rows(&rows)?,
            u64::try_from(total).unwrap_or_default(),
        ))
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO properties (\
                id, tax_id, address, status_id, price, \
                lot_size, year_built, zoning, property_tax, image, \
                property_type_id, created_at, updated_at\
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)";
        let year_built = property.year_built.map(i32::from);
        let kind = property.kind();
        self.exec(
            SQL,
            &[
                &property.id,
                &property.tax_id,
                &property.address,
                &property.status,
                &property.price,
                &property.lot_size,
                &year_built,
                &property.zoning,
                &property.property_tax,
                &property.image,
                &kind,
                &property.created_at,
                &property.updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())?;

        insert_detail(self, property.id, &property.detail)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Inserts the provided [`Detail`] row of the [`Property`] with the given
/// `id`.
async fn insert_detail<C: Connection>(
    db: &Postgres<C>,
    id: property::Id,
    detail: &Detail,
) -> Result<(), Traced<database::Error>> {
    match detail {
        Detail::Residential(r) => {
            const SQL: &str = "\
                INSERT INTO residential_properties (\
                    property_id, bedrooms, bathrooms, building_type, \
                    square_feet, garage_spaces, has_basement, has_pool\
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";
            db.exec(
                SQL,
                &[
                    &id,
                    &i32::from(r.bedrooms),
                    &r.bathrooms,
                    &r.kind,
                    &r.square_feet,
                    &i32::from(r.garage_spaces),
                    &r.has_basement,
                    &r.has_pool,
                ],
            )
            .await
        }
        Detail::Commercial(c) => {
            const SQL: &str = "\
                INSERT INTO commercial_properties (\
                    property_id, square_feet, industry, building_type, \
                    units, parking_spaces, zoning_type\
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)";
            db.exec(
                SQL,
                &[
                    &id,
                    &c.square_feet,
                    &c.industry,
                    &c.kind,
                    &i32::from(c.units),
                    &i32::from(c.parking_spaces),
                    &c.zoning_type,
                ],
            )
            .await
        }
    }
    .map(drop)
    .map_err(tracerr::wrap!())
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE properties \
            SET address = $2, status_id = $3, price = $4, lot_size = $5, \
                year_built = $6, zoning = $7, property_tax = $8, image = $9, \
                updated_at = $10 \
            WHERE id = $1";
        let year_built = property.year_built.map(i32::from);
        _ = self
            .exec(
                SQL,
                &[
                    &property.id,
                    &property.address,
                    &property.status,
                    &property.price,
                    &property.lot_size,
                    &year_built,
                    &property.zoning,
                    &property.property_tax,
                    &property.image,
                    &property.updated_at,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;

        match &property.detail {
            Detail::Residential(r) => {
                const SQL: &str = "\
                    UPDATE residential_properties \
                    SET bedrooms = $2, bathrooms = $3, building_type = $4, \
                        square_feet = $5, garage_spaces = $6, \
                        has_basement = $7, has_pool = $8 \
                    WHERE property_id = $1";
                self.exec(
                    SQL,
                    &[
                        &property.id,
                        &i32::from(r.bedrooms),
                        &r.bathrooms,
                        &r.kind,
                        &r.square_feet,
                        &i32::from(r.garage_spaces),
                        &r.has_basement,
                        &r.has_pool,
                    ],
                )
                .await
            }
            Detail::Commercial(c) => {
                const SQL: &str = "\
                    UPDATE commercial_properties \
                    SET square_feet = $2, industry = $3, building_type = $4, \
                        units = $5, parking_spaces = $6, zoning_type = $7 \
                    WHERE property_id = $1";
                self.exec(
                    SQL,
                    &[
                        &property.id,
                        &c.square_feet,
                        &c.industry,
                        &c.kind,
                        &i32::from(c.units),
                        &i32::from(c.parking_spaces),
                        &c.zoning_type,
                    ],
                )
                .await
            }
        }
        .map(drop)
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<Residential, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Residential, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            DELETE FROM residential_properties \
            WHERE property_id = $1";
        self.exec(SQL, &[by.as_inner()])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<Commercial, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Commercial, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            DELETE FROM commercial_properties \
            WHERE property_id = $1";
        self.exec(SQL, &[by.as_inner()])
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            DELETE FROM properties \
            WHERE id = $1";
        self.exec(SQL, &[by.as_inner()])
            .await
            .map_err(tracerr::wrap!())
    }
}
