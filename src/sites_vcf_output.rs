//! Write the sites-only VCF
//!

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rust_htslib::bcf::{self, record::Numeric};
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail, map_err_with};
use thousands::Separable;

use crate::vcf_types::{VcfInfoValue, VcfSiteRow, VcfSiteTable};
use crate::vcf_utils;

/// Output formats of the sites-only VCF, selected from the output filename extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SitesVcfFormat {
    Vcf,
    VcfGz,
    Bcf,
}

impl SitesVcfFormat {
    pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".vcf", ".vcf.gz", ".vcf.bgz", ".bcf"];

    pub fn from_path(path: &Utf8Path) -> Option<Self> {
        let path = path.as_str();
        if path.ends_with(".vcf") {
            Some(Self::Vcf)
        } else if path.ends_with(".vcf.gz") || path.ends_with(".vcf.bgz") {
            Some(Self::VcfGz)
        } else if path.ends_with(".bcf") {
            Some(Self::Bcf)
        } else {
            None
        }
    }

    fn htslib_format(self) -> bcf::Format {
        match self {
            Self::Vcf | Self::VcfGz => bcf::Format::Vcf,
            Self::Bcf => bcf::Format::Bcf,
        }
    }

    fn is_uncompressed(self) -> bool {
        self == Self::Vcf
    }

    pub fn is_indexable(self) -> bool {
        self != Self::Vcf
    }
}

pub struct SitesVcfSettings {
    pub output_path: Utf8PathBuf,
    pub format: SitesVcfFormat,

    /// If true, build a tabix index for bgzipped VCF output, or a csi index for bcf output
    pub build_index: bool,

    pub thread_count: usize,
}

impl SitesVcfSettings {
    pub fn new(output_path: &Utf8Path, build_index: bool, thread_count: usize) -> SimpleResult<Self> {
        let format = match SitesVcfFormat::from_path(output_path) {
            Some(x) => x,
            None => bail!(
                "Unrecognized output file extension in '{output_path}', expected one of: {}",
                SitesVcfFormat::SUPPORTED_EXTENSIONS.join(" ")
            ),
        };
        if build_index && !format.is_indexable() {
            bail!("Can't build an index for uncompressed VCF output '{output_path}'");
        }
        Ok(Self {
            output_path: output_path.to_owned(),
            format,
            build_index,
            thread_count,
        })
    }
}

#[derive(Default, Deserialize, Serialize)]
pub struct VcfStats {
    pub output_record_count: usize,
}

fn get_sites_vcf_header(site_table: &VcfSiteTable) -> bcf::Header {
    let mut header =
        vcf_utils::get_basic_vcf_header(&site_table.reference_genome, &site_table.contigs);

    // The PASS FILTER record is not added by htslib for our empty header, and needs to be ordered
    // before INFO records.
    header.push_record(br#"##FILTER=<ID=PASS,Description="All filters passed">"#);

    for field in site_table.schema.iter() {
        header.push_record(field.get_vcf_header_line().as_bytes());
    }

    header
}

fn convert_site_row_to_vcf_record(
    vcf: &bcf::Writer,
    row: &VcfSiteRow,
) -> SimpleResult<bcf::Record> {
    let mut record = vcf.empty_record();
    record.set_rid(Some(row.key.locus.contig_index as u32));
    record.set_pos(row.key.locus.position - 1);

    let alleles = row.key.alleles.iter().map(|x| x.as_slice()).collect::<Vec<_>>();
    map_err_with!(
        record.set_alleles(&alleles),
        "Failed to set alleles for VCF record"
    )?;

    record.set_qual(f32::missing());

    for (field, value) in row.info.iter() {
        let id = field.id().as_bytes();
        let result = match value {
            VcfInfoValue::Integer(x) => record.push_info_integer(id, x),
            VcfInfoValue::Float(x) => record.push_info_float(id, x),
        };
        map_err_with!(result, "Failed to set INFO field '{}' in VCF record", field.id())?;
    }

    Ok(record)
}

fn write_sites_vcf_file(
    settings: &SitesVcfSettings,
    site_table: &VcfSiteTable,
) -> SimpleResult<VcfStats> {
    let header = get_sites_vcf_header(site_table);
    let mut vcf = map_err_with!(
        bcf::Writer::from_path(
            &settings.output_path,
            &header,
            settings.format.is_uncompressed(),
            settings.format.htslib_format(),
        ),
        "Failed to open output VCF file '{}'",
        settings.output_path
    )?;

    for row in site_table.rows.iter() {
        let record = convert_site_row_to_vcf_record(&vcf, row)?;
        map_err_with!(
            vcf.write(&record),
            "Failed to write VCF record to '{}'",
            settings.output_path
        )?;
    }

    Ok(VcfStats {
        output_record_count: site_table.rows.len(),
    })
}

/// Write all sites to a sites-only VCF, and optionally index it
///
pub fn write_sites_only_vcf(
    settings: &SitesVcfSettings,
    site_table: &VcfSiteTable,
) -> SimpleResult<VcfStats> {
    info!("Writing sites-only VCF to file: '{}'", settings.output_path);

    let vcf_stats = write_sites_vcf_file(settings, site_table)?;

    if settings.build_index {
        let build_tbi = settings.format == SitesVcfFormat::VcfGz;
        map_err_with!(
            vcf_utils::build_bcf_index(&settings.output_path, settings.thread_count, build_tbi),
            "Failed to index output file '{}'",
            settings.output_path
        )?;
    }

    info!(
        "Finished writing {} sites-only VCF records",
        vcf_stats.output_record_count.separate_with_commas()
    );

    Ok(vcf_stats)
}
