//! Static lookup tables injected into the filter prompt so the model can map
//! natural region and VM size names onto catalog field values.

use serde::Serialize;

/// Region code (`armRegionName`) to display name.
pub const REGIONS: &[(&str, &str)] = &[
    ("australiacentral", "Australia Central"),
    ("australiacentral2", "Australia Central 2"),
    ("australiaeast", "Australia East"),
    ("australiasoutheast", "Australia Southeast"),
    ("brazilsouth", "Brazil South"),
    ("brazilsoutheast", "Brazil Southeast"),
    ("brazilus", "Brazil US"),
    ("canadacentral", "Canada Central"),
    ("canadaeast", "Canada East"),
    ("centralindia", "Central India"),
    ("centralus", "Central US"),
    ("centraluseuap", "Central US EUAP"),
    ("eastasia", "East Asia"),
    ("eastus", "East US"),
    ("eastus2", "East US 2"),
    ("eastus2euap", "East US 2 EUAP"),
    ("eastusstg", "East US STG"),
    ("francecentral", "France Central"),
    ("francesouth", "France South"),
    ("germanynorth", "Germany North"),
    ("germanywestcentral", "Germany West Central"),
    ("israelcentral", "Israel Central"),
    ("italynorth", "Italy North"),
    ("japaneast", "Japan East"),
    ("japanwest", "Japan West"),
    ("jioindiacentral", "Jio India Central"),
    ("jioindiawest", "Jio India West"),
    ("koreacentral", "Korea Central"),
    ("koreasouth", "Korea South"),
    ("mexicocentral", "Mexico Central"),
    ("newzealandnorth", "New Zealand North"),
    ("northcentralus", "North Central US"),
    ("northeurope", "North Europe"),
    ("norwayeast", "Norway East"),
    ("norwaywest", "Norway West"),
    ("polandcentral", "Poland Central"),
    ("qatarcentral", "Qatar Central"),
    ("southafricanorth", "South Africa North"),
    ("southafricawest", "South Africa West"),
    ("southcentralus", "South Central US"),
    ("southcentralusstg", "South Central US STG"),
    ("southindia", "South India"),
    ("southeastasia", "Southeast Asia"),
    ("spaincentral", "Spain Central"),
    ("swedencentral", "Sweden Central"),
    ("swedensouth", "Sweden South"),
    ("switzerlandnorth", "Switzerland North"),
    ("switzerlandwest", "Switzerland West"),
    ("uaecentral", "UAE Central"),
    ("uaenorth", "UAE North"),
    ("uksouth", "UK South"),
    ("ukwest", "UK West"),
    ("westcentralus", "West Central US"),
    ("westeurope", "West Europe"),
    ("westindia", "West India"),
    ("westus", "West US"),
    ("westus2", "West US 2"),
    ("westus3", "West US 3"),
];

/// One VM series family in the size taxonomy.
#[derive(Debug, Serialize, Clone, Copy)]
pub struct VmFamily {
    #[serde(rename = "VM_Type")]
    pub vm_type: &'static str,
    #[serde(rename = "Series_Family")]
    pub series_family: &'static str,
    #[serde(rename = "Purpose")]
    pub purpose: &'static str,
    #[serde(rename = "Description")]
    pub description: &'static str,
    #[serde(rename = "armSkuName_Example")]
    pub arm_sku_name_example: &'static str,
    #[serde(rename = "Keywords")]
    pub keywords: &'static str,
}

pub const VM_FAMILIES: &[VmFamily] = &[
    VmFamily {
        vm_type: "General Purpose",
        series_family: "A-family",
        purpose: "Entry-level economical workloads",
        description: "Balanced CPU-to-memory ratio, suitable for testing, development, small to medium databases, low to medium traffic web servers",
        arm_sku_name_example: "Standard_A1_v2",
        keywords: "economical, entry-level, balanced",
    },
    VmFamily {
        vm_type: "General Purpose",
        series_family: "B-family",
        purpose: "Burstable workloads",
        description: "CPU credit model for variable workloads, ideal for web servers, proof of concepts, small databases, development environments",
        arm_sku_name_example: "Standard_B1s",
        keywords: "burstable, credits, variable performance",
    },
    VmFamily {
        vm_type: "General Purpose",
        series_family: "D-family",
        purpose: "Enterprise-grade applications, relational databases, in-memory caching, data analytics",
        description: "High CPU-to-memory ratio, faster processors, more memory per core",
        arm_sku_name_example: "Standard_D2_v5",
        keywords: "enterprise, relational databases, in-memory caching",
    },
    VmFamily {
        vm_type: "General Purpose",
        series_family: "DC-family",
        purpose: "Confidential computing with data protection and integrity",
        description: "Enhanced security features, hardware-based Trusted Execution Environments (TEEs)",
        arm_sku_name_example: "Standard_DC2s_v3",
        keywords: "confidential, security, TEE",
    },
    VmFamily {
        vm_type: "Compute Optimized",
        series_family: "F-family",
        purpose: "Medium traffic web servers, network appliances, batch processes, application servers",
        description: "High CPU-to-memory ratio, powerful processors for compute-intensive tasks",
        arm_sku_name_example: "Standard_F2s_v2",
        keywords: "compute-intensive, high CPU, batch processing",
    },
    VmFamily {
        vm_type: "Compute Optimized",
        series_family: "FX-family",
        purpose: "Electronic Design Automation (EDA), large memory relational databases, medium to large caches, in-memory analytics",
        description: "High frequency CPUs, large cache per core, exceptional computational power",
        arm_sku_name_example: "Standard_FX4mds",
        keywords: "EDA, large memory, high frequency",
    },
    VmFamily {
        vm_type: "Memory Optimized",
        series_family: "E-family",
        purpose: "Relational databases, medium to large caches, in-memory analytics",
        description: "High memory-to-core ratio, supports memory-intensive workloads",
        arm_sku_name_example: "Standard_E2_v5",
        keywords: "memory-intensive, high memory, caches",
    },
    VmFamily {
        vm_type: "Memory Optimized",
        series_family: "Eb-family",
        purpose: "High remote storage performance for memory-intensive workloads",
        description: "Similar to E-family but with enhanced storage capabilities",
        arm_sku_name_example: "Standard_Eb4s_v5",
        keywords: "remote storage, high performance, memory-intensive",
    },
    VmFamily {
        vm_type: "Memory Optimized",
        series_family: "EC-family",
        purpose: "Confidential computing for memory-intensive workloads",
        description: "Security features combined with high memory capacities",
        arm_sku_name_example: "Standard_EC2s_v5",
        keywords: "confidential, memory-intensive, security",
    },
    VmFamily {
        vm_type: "Memory Optimized",
        series_family: "M-family",
        purpose: "Extremely large databases, large amounts of memory",
        description: "Ultra-high memory capacities, high vCPU capabilities",
        arm_sku_name_example: "Standard_M128ms",
        keywords: "ultra-high memory, large databases, high vCPU",
    },
    VmFamily {
        vm_type: "Storage Optimized",
        series_family: "L-family",
        purpose: "High disk throughput and I/O, big data, SQL and NoSQL databases, data warehousing, large transactional databases",
        description: "High disk throughput, large local disk storage capacities",
        arm_sku_name_example: "Standard_L8s_v3",
        keywords: "storage-intensive, high throughput, big data",
    },
    VmFamily {
        vm_type: "GPU Accelerated",
        series_family: "NC-family",
        purpose: "Compute-intensive, graphics-intensive, visualization",
        description: "Equipped with NVIDIA GPUs for acceleration",
        arm_sku_name_example: "Standard_NC6",
        keywords: "GPU, NVIDIA, visualization",
    },
    VmFamily {
        vm_type: "GPU Accelerated",
        series_family: "ND-family",
        purpose: "Large memory compute-intensive, large memory graphics-intensive, large memory visualization",
        description: "Specialized for deep learning and AI with powerful GPUs",
        arm_sku_name_example: "Standard_ND40rs_v2",
        keywords: "deep learning, AI, large memory",
    },
    VmFamily {
        vm_type: "GPU Accelerated",
        series_family: "NG-family",
        purpose: "Virtual Desktop (VDI), cloud gaming",
        description: "Optimized for graphics and streaming with AMD Radeon™ PRO GPUs",
        arm_sku_name_example: "Standard_NG32ads_V620_v1",
        keywords: "gaming, VDI, AMD Radeon",
    },
    VmFamily {
        vm_type: "GPU Accelerated",
        series_family: "NV-family",
        purpose: "Virtual desktop (VDI), single-precision compute, video encoding and rendering",
        description: "Designed for graphics-intensive applications with NVIDIA or AMD GPUs",
        arm_sku_name_example: "Standard_NV6",
        keywords: "graphics, rendering, NVIDIA",
    },
    VmFamily {
        vm_type: "FPGA Accelerated",
        series_family: "NP-family",
        purpose: "Machine learning inference, video transcoding, database search and analytics",
        description: "Equipped with FPGAs for custom hardware acceleration",
        arm_sku_name_example: "Standard_NP10s",
        keywords: "FPGA, inference, transcoding",
    },
    VmFamily {
        vm_type: "High Performance Compute",
        series_family: "HB-family",
        purpose: "High memory bandwidth, fluid dynamics, weather modeling",
        description: "High-performance CPUs and fast memory for compute-intensive workloads",
        arm_sku_name_example: "Standard_HB120rs_v2",
        keywords: "HPC, high bandwidth, weather modeling",
    },
    VmFamily {
        vm_type: "High Performance Compute",
        series_family: "HC-family",
        purpose: "High density compute, finite element analysis, molecular dynamics, computational chemistry",
        description: "Exceptional computational capabilities for intensive processing",
        arm_sku_name_example: "Standard_HC44rs",
        keywords: "finite element analysis, molecular dynamics, computational chemistry",
    },
    VmFamily {
        vm_type: "High Performance Compute",
        series_family: "HX-family",
        purpose: "Large memory capacity, Electronic Design Automation (EDA)",
        description: "High memory and CPU performance for memory-intensive HPC tasks",
        arm_sku_name_example: "Standard_HX176rs",
        keywords: "large memory, EDA, high performance",
    },
];

/// Display name for a region code, case-insensitive. Unknown codes are returned as given.
pub fn region_display_name(code: &str) -> &str {
    let normalized = code.to_lowercase();
    REGIONS
        .iter()
        .find(|(c, _)| *c == normalized)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Region code for a display name, case-insensitive. Unknown names are returned as given.
pub fn region_code(display_name: &str) -> &str {
    REGIONS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(display_name))
        .map(|(c, _)| *c)
        .unwrap_or(display_name)
}

/// Reference tables handed to the filter model as context.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceData {
    pub regions: &'static [(&'static str, &'static str)],
    pub vm_families: &'static [VmFamily],
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            regions: REGIONS,
            vm_families: VM_FAMILIES,
        }
    }
}

impl ReferenceData {
    /// Display name to code mapping rendered as a JSON object.
    pub fn regions_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .regions
            .iter()
            .map(|(code, name)| (name.to_string(), serde_json::Value::from(*code)))
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    pub fn vm_families_json(&self) -> String {
        serde_json::to_string(self.vm_families).unwrap_or_else(|_| "[]".to_string())
    }
}
