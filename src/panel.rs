use crate::error::GeopopError;
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of genetic-association components in a profile.
///
/// Profiles describe admixture against nine named ancestral clusters
/// (NORTHEASTASIAN through SUBSAHARANAFRICA); the loaders treat the
/// columns positionally.
pub const N_COMPONENTS: usize = 9;

#[derive(Debug, Deserialize)]
struct GeoRecord {
    #[serde(rename = "POPULATION")]
    population: String,
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Long")]
    long: f64,
}

/// The reference populations: names, coordinates and genetic profiles,
/// all in geographic-table row order.
///
/// Immutable once loaded; every matrix computed from it shares this row
/// ordering.
#[derive(Debug)]
pub struct ReferencePanel {
    names: Vec<String>,
    coords: Array2<f64>,
    genes: Array2<f64>,
}

impl ReferencePanel {
    /// Loads the panel from the geographic table (`POPULATION,Lat,Long`,
    /// with header) and the genetic reference table (headerless, population
    /// key followed by nine numeric components).
    ///
    /// Every population must appear exactly once in each table; a genetic
    /// row keyed by an unknown population or a population without a
    /// genetic profile is a fatal mismatch.
    pub fn from_readers<G: Read, N: Read>(geo: G, gen: N) -> Result<Self, GeopopError> {
        let mut rdr = csv::Reader::from_reader(geo);

        let headers = rdr.headers()?.clone();
        for required in ["POPULATION", "Lat", "Long"] {
            if !headers.iter().any(|h| h == required) {
                return Err(GeopopError::MissingColumn {
                    table: "geographic",
                    column: required,
                });
            }
        }
        if headers.len() != 3 {
            return Err(GeopopError::ColumnCount {
                table: "geographic",
                expected: 3,
                found: headers.len(),
            });
        }

        let mut names = Vec::new();
        let mut coords = Vec::new();
        let mut seen = HashSet::new();
        for record in rdr.deserialize() {
            let record: GeoRecord = record?;
            if !seen.insert(record.population.clone()) {
                return Err(GeopopError::DuplicatePopulation(record.population));
            }
            names.push(record.population);
            coords.push((record.lat, record.long));
        }
        if names.is_empty() {
            return Err(GeopopError::EmptyPanel);
        }

        let profiles = read_profiles(gen, &seen)?;

        let n = names.len();
        let mut coord_matrix = Array2::zeros((n, 2));
        let mut gene_matrix = Array2::zeros((n, N_COMPONENTS));
        for (i, name) in names.iter().enumerate() {
            let (lat, long) = coords[i];
            coord_matrix[[i, 0]] = lat;
            coord_matrix[[i, 1]] = long;
            let profile = profiles
                .get(name.as_str())
                .ok_or_else(|| GeopopError::MissingProfile(name.clone()))?;
            for (j, value) in profile.iter().enumerate() {
                gene_matrix[[i, j]] = *value;
            }
        }

        Ok(Self {
            names,
            coords: coord_matrix,
            genes: gene_matrix,
        })
    }

    pub fn from_paths(geo: &Path, gen: &Path) -> Result<Self, GeopopError> {
        Self::from_readers(File::open(geo)?, File::open(gen)?)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn lat(&self, i: usize) -> f64 {
        self.coords[[i, 0]]
    }

    pub fn long(&self, i: usize) -> f64 {
        self.coords[[i, 1]]
    }

    /// Coordinates as an `n x 2` matrix, columns (Lat, Long).
    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }

    /// Genetic profiles as an `n x 9` matrix.
    pub fn genes(&self) -> &Array2<f64> {
        &self.genes
    }
}

fn read_profiles<R: Read>(
    gen: R,
    known: &HashSet<String>,
) -> Result<HashMap<String, Vec<f64>>, GeopopError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_reader(gen);
    let mut profiles = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        if record.len() != N_COMPONENTS + 1 {
            return Err(GeopopError::ColumnCount {
                table: "genetic reference",
                expected: N_COMPONENTS + 1,
                found: record.len(),
            });
        }
        let name = record[0].to_string();
        if !known.contains(&name) {
            return Err(GeopopError::UnknownPopulation(name));
        }
        let mut profile = Vec::with_capacity(N_COMPONENTS);
        for field in record.iter().skip(1) {
            let value =
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| GeopopError::InvalidNumber {
                        table: "genetic reference",
                        value: field.to_string(),
                    })?;
            profile.push(value);
        }
        if profiles.insert(name.clone(), profile).is_some() {
            return Err(GeopopError::DuplicatePopulation(name));
        }
    }
    Ok(profiles)
}

/// One individual to be located: sample id, group label and genetic
/// profile. Components that failed numeric parsing are NaN.
#[derive(Debug)]
pub struct TestIndividual {
    pub sample_id: String,
    pub group: String,
    pub genes: Array1<f64>,
}

/// Loads the individual table (`SAMPLE_ID,<9 components>,GROUP_ID`, with
/// header). Non-numeric genetic values coerce to NaN with a warning and
/// flow through prediction as missing data.
pub fn load_individuals<R: Read>(reader: R) -> Result<Vec<TestIndividual>, GeopopError> {
    let mut rdr = csv::Reader::from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() != N_COMPONENTS + 2 {
        return Err(GeopopError::ColumnCount {
            table: "individual",
            expected: N_COMPONENTS + 2,
            found: headers.len(),
        });
    }
    if headers.iter().next() != Some("SAMPLE_ID") {
        return Err(GeopopError::MissingColumn {
            table: "individual",
            column: "SAMPLE_ID",
        });
    }
    if headers.iter().last() != Some("GROUP_ID") {
        return Err(GeopopError::MissingColumn {
            table: "individual",
            column: "GROUP_ID",
        });
    }

    let mut individuals = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let sample_id = record[0].to_string();
        let group = record[N_COMPONENTS + 1].to_string();
        let mut genes = Array1::zeros(N_COMPONENTS);
        for j in 0..N_COMPONENTS {
            let field = &record[j + 1];
            genes[j] = match field.trim().parse::<f64>() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!(
                        "sample {}: non-numeric genetic value `{}`, treating as missing",
                        sample_id,
                        field
                    );
                    f64::NAN
                }
            };
        }
        individuals.push(TestIndividual {
            sample_id,
            group,
            genes,
        });
    }
    Ok(individuals)
}

pub fn load_individuals_from_path(path: &Path) -> Result<Vec<TestIndividual>, GeopopError> {
    load_individuals(File::open(path)?)
}
